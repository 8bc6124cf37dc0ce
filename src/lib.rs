//! # kumi
//!
//! Onion-model middleware and first-match routing for small hyper services.
//!
//! An application is an ordered [`Chain`] of [`Middleware`]. [`compose`]
//! folds it into one unit; every unit receives the request and a [`Next`]
//! continuation, and decides whether to answer, to pass the request on, or
//! to do work on both sides of `next.run().await`. The [`Router`] is one such
//! unit: it compiles `"/page/:pid/user/:uid"` patterns, picks the first
//! route matching the method and path, and falls through to the rest of the
//! chain when none does.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use kumi::{Chain, Request, Router, Server, compose, endpoint, middleware::Static};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new()
//!         .get("/", endpoint(index))
//!         .get("/user/:uid", endpoint(user));
//!
//!     let app = compose(
//!         Chain::new()
//!             .with(router.routes())
//!             .with(Static::new("public", "/static"))
//!             .with(endpoint(not_found)),
//!     );
//!
//!     Server::bind("127.0.0.1:8080").serve(app).await.unwrap();
//! }
//!
//! async fn index(_req: Request) -> &'static str {
//!     "root"
//! }
//!
//! async fn user(req: Request) -> String {
//!     format!("user {}", req.param("uid").unwrap_or("unknown"))
//! }
//!
//! async fn not_found(_req: Request) -> StatusCode {
//!     StatusCode::NOT_FOUND
//! }
//! ```
//!
//! ## Failure model
//!
//! Middleware returns `Result<(), Error>`. Nothing in the chain or router
//! swallows an `Err`: it surfaces from the composed unit and the [`Server`]
//! answers `500` with the error text.

mod compose;
mod error;
mod handler;
mod method;
mod query;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod middleware;

pub use compose::{Chain, Composed, Next, compose};
pub use error::{BoxError, Error};
pub use handler::{BoxFuture, BoxedMiddleware, Endpoint, Middleware, endpoint};
pub use method::{Method, MethodSet, UnknownMethod};
pub use query::{extract_query_string, parse_query};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::RouteLayer;
pub use router::{Router, Routes};
pub use server::Server;
