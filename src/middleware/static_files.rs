//! Static file serving.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use http::StatusCode;
use regex::Regex;
use tracing::debug;

use crate::compose::Next;
use crate::handler::{BoxFuture, Middleware};
use crate::method::Method;
use crate::request::Request;
use crate::response::{ContentType, Response};

static DOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2,}").unwrap_or_else(|e| panic!("dots pattern: {e}")));
static SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").unwrap_or_else(|e| panic!("slashes pattern: {e}")));

/// Serves files below `base_dir` for `GET` requests under `prefix`.
///
/// `/static/css/site.css` with prefix `/static` reads
/// `<base_dir>/css/site.css`. Requests outside the prefix, or with another
/// method, continue down the chain. Requests inside it are always answered:
/// `200` with the file, or `404` when the path is not a readable file.
///
/// ```rust,no_run
/// use kumi::{Chain, compose, middleware::Static};
///
/// let app = compose(Chain::new().with(Static::new("public", "/static")));
/// ```
#[derive(Clone, Debug)]
pub struct Static {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    base_dir: PathBuf,
    prefix: String,
}

impl Static {
    pub fn new(base_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner { base_dir: base_dir.into(), prefix: prefix.into() }),
        }
    }
}

impl Middleware for Static {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let Some(rest) = req.path().strip_prefix(inner.prefix.as_str()) else {
                return next.run().await;
            };
            if req.method() != Method::Get.as_str() {
                return next.run().await;
            }

            let path = sanitize(rest);
            let full = inner.base_dir.join(path.trim_start_matches('/'));
            debug!(url = %req.url(), file = %full.display(), "static lookup");

            req.respond(read(&path, full).await);
            Ok(())
        })
    }
}

/// Removes every `..`-style run of dots and every repeated `/`.
fn sanitize(path: &str) -> String {
    let path = DOTS.replace_all(path, "");
    SLASHES.replace_all(&path, "").into_owned()
}

async fn read(path: &str, full: PathBuf) -> Response {
    let meta = match tokio::fs::metadata(&full).await {
        Ok(meta) => meta,
        Err(e) => return not_found(e.to_string()),
    };
    if !meta.is_file() {
        return not_found(format!("{path} is not found!"));
    }

    match tokio::fs::read(&full).await {
        Ok(bytes) => {
            let ext = full.extension().and_then(|e| e.to_str()).unwrap_or_default();
            Response::builder().bytes(ContentType::from_extension(ext), bytes)
        }
        Err(e) => not_found(e.to_string()),
    }
}

fn not_found(body: String) -> Response {
    Response::builder().status(StatusCode::NOT_FOUND).text(body)
}
