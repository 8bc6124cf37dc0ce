//! HTTP server and graceful shutdown.
//!
//! The server is the only place a failed middleware outcome becomes a
//! response: every request runs through the root middleware, and an `Err`
//! coming back out is logged and answered with `500` and the error text.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::compose::Next;
use crate::error::Error;
use crate::handler::{BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use kumi::Server;
    /// let server = Server::bind("127.0.0.1:8080");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and feeding every request to `app`.
    ///
    /// `app` is usually a [`Composed`](crate::Composed) chain. It is invoked
    /// with [`Next::end`] as its continuation.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, app: impl Middleware) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared by every connection task without copying the chain.
        let app: BoxedMiddleware = Arc::new(app);

        info!(addr = %self.addr, "kumi listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        // Futures must not move in memory after the first poll; `tokio::pin!`
        // pins the shutdown future on the stack so the loop can poll it
        // repeatedly.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom instead of randomly, so
                // a SIGTERM stops accepting even while more connections are
                // queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper
                    // IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // `service_fn` is called once per request on the
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        // `auto::Builder` serves HTTP/1.1 or HTTP/2, whichever
                        // the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("kumi stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through `app` and turns its outcome into a response.
///
/// The error type is [`Infallible`](std::convert::Infallible): body read
/// failures, failed outcomes and unanswered requests all become responses
/// here, so hyper never sees an error.
async fn dispatch(
    app: BoxedMiddleware,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let url = parts.uri.path_and_query().map_or("/", |pq| pq.as_str()).to_owned();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(url = %url, "failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let headers = parts.headers.iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    let request = Request::from_parts(parts.method.as_str().to_owned(), url, headers, body);
    let response = settle(app.call(request.clone(), Next::end()).await, &request);

    Ok(response.into_inner())
}

/// Picks the response for a finished chain.
fn settle(outcome: Result<(), Error>, req: &Request) -> Response {
    match outcome {
        Err(e) => {
            let detail = failure_detail(&e);
            error!(method = %req.method(), url = %req.url(), "request failed: {detail}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .text(detail)
        }
        Ok(()) => req.take_response().unwrap_or_else(|| {
            warn!(method = %req.method(), url = %req.url(), "no middleware responded");
            Response::status(StatusCode::NOT_FOUND)
        }),
    }
}

/// The error and its source chain, one per line.
fn failure_detail(err: &Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        detail.push_str("\ncaused by: ");
        detail.push_str(&e.to_string());
        source = e.source();
    }
    detail
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C the process receives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves, which disables the SIGTERM arm on
    // non-Unix platforms.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
