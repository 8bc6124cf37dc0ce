//! The middleware trait and type erasure.
//!
//! # How middleware is stored
//!
//! A chain holds units of *different* concrete types — closures, the router's
//! [`Routes`](crate::Routes), [`Static`](crate::middleware::Static), nested
//! [`Composed`](crate::Composed) chains — in one slice. They are erased
//! behind `Arc<dyn Middleware>` so the slice is uniform:
//!
//! ```text
//! async fn auth(req: Request, next: Next) -> Result<(), Error> { … }
//!        ↓ Chain::new().with(auth)
//! Arc::new(auth)                        ← BoxedMiddleware
//!        ↓
//! mw.call(req, next)  at request time   ← one vtable dispatch
//!        ↓
//! Box::pin(auth(req, next))             ← BoxFuture
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::compose::Next;
use crate::error::Error;
use crate::request::Request;
use crate::response::IntoResponse;

/// A heap-allocated, type-erased middleware outcome.
///
/// `Ok(())` means the unit finished, whether or not it continued down the
/// chain. `Err` is a failed outcome and bubbles up to the transport.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;

/// A request-processing step with an explicit continuation.
///
/// Automatically implemented for every function or closure of the shape
///
/// ```text
/// async fn name(req: Request, next: Next) -> Result<(), Error>
/// ```
///
/// A unit may respond via [`Request::respond`], await `next.run()` to hand
/// control to the rest of the chain, or both:
///
/// ```rust
/// use kumi::{Error, Next, Request};
///
/// async fn timing(req: Request, next: Next) -> Result<(), Error> {
///     let start = std::time::Instant::now();
///     next.run().await?;
///     tracing::info!(url = %req.url(), elapsed = ?start.elapsed(), "handled");
///     Ok(())
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

/// A type-erased middleware shared across concurrent requests.
pub type BoxedMiddleware = Arc<dyn Middleware>;

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self)(req, next))
    }
}

// ── Endpoints ────────────────────────────────────────────────────────────────

/// Adapts a plain handler into a terminal middleware.
///
/// The handler's return value is sent as the response and the continuation
/// is never invoked:
///
/// ```rust
/// use kumi::{Request, Router, endpoint};
///
/// async fn user(req: Request) -> String {
///     format!("user {}", req.param("uid").unwrap_or("?"))
/// }
///
/// let router = Router::new().get("/user/:uid", endpoint(user));
/// ```
pub fn endpoint<F, Fut, R>(handler: F) -> Endpoint<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Endpoint(handler)
}

/// Middleware returned by [`endpoint`].
#[derive(Clone, Copy)]
pub struct Endpoint<F>(F);

impl<F, Fut, R> Middleware for Endpoint<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, _next: Next) -> BoxFuture {
        let fut = (self.0)(req.clone());
        Box::pin(async move {
            req.respond(fut.await);
            Ok(())
        })
    }
}
