//! Incoming HTTP request handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;

use crate::response::{IntoResponse, Response};

/// A handle to one in-flight request.
///
/// Cloning is cheap: every clone shares the same underlying request and the
/// same single-use response slot, so whichever middleware calls
/// [`respond`](Request::respond) first decides what the client receives.
#[derive(Clone)]
pub struct Request {
    shared: Arc<Shared>,
    params: Arc<HashMap<String, String>>,
    query: Arc<HashMap<String, String>>,
}

struct Shared {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    response: Mutex<Option<Response>>,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    ///
    /// `url` is the request target as sent by the client: a path with an
    /// optional `?query` suffix.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self::from_parts(method.into(), url.into(), Vec::new(), Bytes::new())
    }

    pub(crate) fn from_parts(
        method: String,
        url: String,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            shared: Arc::new(Shared { method, url, headers, body, response: Mutex::new(None) }),
            params: Arc::default(),
            query: Arc::default(),
        }
    }

    /// Returns a handle to the same request carrying a route's extracted
    /// path parameters and query-string mapping.
    pub(crate) fn with_route(
        &self,
        params: HashMap<String, String>,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            params: Arc::new(params),
            query: Arc::new(query),
        }
    }

    pub fn method(&self) -> &str { &self.shared.method }
    pub fn url(&self) -> &str { &self.shared.url }
    pub fn headers(&self) -> &[(String, String)] { &self.shared.headers }
    pub fn body(&self) -> &[u8] { &self.shared.body }

    /// The url without its query string.
    pub fn path(&self) -> &str {
        let url = self.url();
        url.split_once('?').map_or(url, |(path, _)| path)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.shared.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    /// Only set once the router has matched the request.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    /// Returns a query-string value, e.g. `req.query("type")` on
    /// `/page/1?type=news` returns `Some("news")`. Only set once the router
    /// has matched the request.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> { &self.query }

    /// Sends `res` to the client.
    ///
    /// Single use: returns `false` and discards `res` if a response was
    /// already sent for this request.
    pub fn respond(&self, res: impl IntoResponse) -> bool {
        let mut slot = self.shared.response.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::warn!(method = %self.method(), url = %self.url(), "response already sent, ignoring");
            return false;
        }
        *slot = Some(res.into_response());
        true
    }

    pub fn responded(&self) -> bool {
        self.shared.response.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Removes the response sent for this request, if any.
    ///
    /// Called by the transport after the middleware chain settles.
    pub fn take_response(&self) -> Option<Response> {
        self.shared.response.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method())
            .field("url", &self.url())
            .field("params", &self.params)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn path_strips_query() {
        assert_eq!(Request::new("GET", "/a/b?x=1?y").path(), "/a/b");
        assert_eq!(Request::new("GET", "/a/b").path(), "/a/b");
    }

    #[test]
    fn respond_is_single_use_across_clones() {
        let req = Request::new("GET", "/");
        let routed = req.with_route(HashMap::new(), HashMap::new());

        assert!(routed.respond("first"));
        assert!(!req.respond(StatusCode::IM_A_TEAPOT));
        assert!(req.responded());

        let res = req.take_response().expect("response");
        assert_eq!(res.body(), b"first");
        assert!(!routed.responded());
    }

    #[test]
    fn route_params_stay_on_routed_handle() {
        let req = Request::new("GET", "/users/7?tab=posts");
        let routed = req.with_route(
            HashMap::from([("id".to_owned(), "7".to_owned())]),
            HashMap::from([("tab".to_owned(), "posts".to_owned())]),
        );
        assert_eq!(routed.param("id"), Some("7"));
        assert_eq!(routed.query("tab"), Some("posts"));
        assert_eq!(req.param("id"), None);
    }
}
