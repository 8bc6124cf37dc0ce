//! First-match request router.
//!
//! Routes are tried in the order they were registered. The first one whose
//! pattern matches the path and whose method set contains the request method
//! handles the request; there is no specificity ranking. When nothing
//! matches, the router hands the request to the rest of the chain, so a
//! "not found" response is the job of a later middleware.

use std::sync::Arc;

use tracing::debug;

use crate::compose::Next;
use crate::error::Error;
use crate::handler::{BoxFuture, Middleware};
use crate::method::{Method, MethodSet};
use crate::query::extract_query_string;
use crate::request::Request;
use crate::route::RouteLayer;

/// The application router.
///
/// Build it once at startup, then freeze it into a middleware with
/// [`Router::routes`]. Each registration returns `self` so calls chain.
#[derive(Default)]
pub struct Router {
    layers: Vec<RouteLayer>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for a method set + path pattern. Returns `self`
    /// for chaining.
    ///
    /// Path parameters use `:name` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use kumi::{Method, Request, Router, endpoint};
    /// # async fn user(_: Request) -> &'static str { "" }
    /// # async fn edit(_: Request) -> &'static str { "" }
    /// Router::new()
    ///     .on(Method::Get, "/user/:uid", endpoint(user))
    ///     .on([Method::Put, Method::Patch], "/user/:uid", endpoint(edit));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` cannot be compiled, which happens only when its
    /// matcher exceeds the regex engine's size limit. Use [`Router::try_on`]
    /// to handle the error instead.
    pub fn on(self, methods: impl Into<MethodSet>, path: &str, handler: impl Middleware) -> Self {
        self.try_on(methods, path, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Like [`Router::on`], returning the compile error instead of panicking.
    pub fn try_on(
        mut self,
        methods: impl Into<MethodSet>,
        path: &str,
        handler: impl Middleware,
    ) -> Result<Self, Error> {
        let layer = RouteLayer::compile(methods, path, Arc::new(handler))?;
        self.layers.push(layer);
        Ok(self)
    }

    pub fn get(self, path: &str, handler: impl Middleware) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Middleware) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Middleware) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Middleware) -> Self {
        self.on(Method::Patch, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Middleware) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Freezes the route table into a middleware.
    pub fn routes(self) -> Routes {
        Routes { table: self.layers.into() }
    }
}

/// The routing middleware produced by [`Router::routes`].
///
/// Cheap to clone; the route table is shared and read-only.
#[derive(Clone)]
pub struct Routes {
    table: Arc<[RouteLayer]>,
}

impl Routes {
    /// The first layer accepting `method` on the path portion of `url`.
    pub fn find(&self, method: &str, url: &str) -> Option<&RouteLayer> {
        self.table
            .iter()
            .find(|layer| layer.matches(url) && layer.accepts(method))
    }

    pub fn layers(&self) -> &[RouteLayer] {
        &self.table
    }
}

impl Middleware for Routes {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let Some(layer) = self.find(req.method(), req.path()) else {
            return next.run();
        };

        let params = layer.extract_params(req.path());
        let query = extract_query_string(req.url());
        debug!(
            method = %req.method(),
            url = %req.url(),
            route = %layer.pattern(),
            ?params,
            ?query,
            "route matched"
        );

        layer.handler.call(req.with_route(params, query), next)
    }
}
