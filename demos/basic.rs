//! Minimal kumi application — an HTML index, a parameterised page, static
//! files and a 404 fallback.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://127.0.0.1:8080/
//!   curl 'http://127.0.0.1:8080/user/cuijian?tab=posts'
//!   curl http://127.0.0.1:8080/static/index.css
//!   curl http://127.0.0.1:8080/missing

use http::StatusCode;
use kumi::{Chain, Error, Next, Request, Response, Router, Server, compose, endpoint, middleware::Static};

const INDEX: &str = r#"<html>
  <head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8" />
    <title>kumi</title>
  </head>
  <body>root</body>
</html>
"#;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let router = Router::new()
        .get("/", endpoint(index))
        .get("/user/:uid", endpoint(user));

    let base_dir = std::env::current_dir()
        .expect("current dir")
        .join("public");

    let app = compose(
        Chain::new()
            .with(timing)
            .with(router.routes())
            .with(Static::new(base_dir, "/static"))
            .with(endpoint(not_found)),
    );

    Server::bind("127.0.0.1:8080")
        .serve(app)
        .await
        .expect("server error");
}

// Wraps everything after it: the log line is written once the inner chain
// has finished.
async fn timing(req: Request, next: Next) -> Result<(), Error> {
    let start = std::time::Instant::now();
    let outcome = next.run().await;
    tracing::info!(method = %req.method(), url = %req.url(), elapsed = ?start.elapsed(), "handled");
    outcome
}

async fn index(_req: Request) -> Response {
    Response::html(INDEX)
}

// GET /user/:uid
async fn user(req: Request) -> String {
    let uid = req.param("uid").unwrap_or("unknown");
    match req.query("tab") {
        Some(tab) => format!("User Page: {uid} ({tab})"),
        None => format!("User Page: {uid}"),
    }
}

async fn not_found(req: Request) -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .text(format!("{} is not found!", req.path()))
}
