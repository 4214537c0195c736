use http::Method;
use tracing::error;

use super::core::Router;
use super::error::RouteError;
use super::pattern;
use crate::dispatcher::HandlerRef;
use crate::middleware::{MiddlewareRef, MiddlewareVec};

/// Routes sharing a path prefix and middleware.
///
/// Group middleware is pushed down onto every route registered through the
/// group, ahead of the route's own middleware. Nested groups concatenate both
/// prefix and middleware, outer group first.
///
/// ```rust
/// use http::Method;
/// use routetrie::dispatcher::{handler_fn, HandlerResponse};
/// use routetrie::router::Router;
///
/// let ok = || handler_fn("ok", |_req| HandlerResponse::json(200, serde_json::Value::Null));
/// let mut router = Router::new();
/// let mut api = router.group("/api", vec![]);
/// api.register_route(Method::GET, "/users", ok(), vec![]).unwrap();
/// api.group("/v2", vec![]).register_route(Method::GET, "/users", ok(), vec![]).unwrap();
///
/// assert!(router.find_route(&Method::GET, "/api/users").is_some());
/// assert!(router.find_route(&Method::GET, "/api/v2/users").is_some());
/// ```
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    prefix: String,
    middleware: MiddlewareVec,
}

impl<'r> RouteGroup<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: String, middleware: MiddlewareVec) -> Self {
        Self {
            router,
            prefix,
            middleware,
        }
    }

    /// Full prefix of this group
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register `pattern` under this group's prefix.
    ///
    /// `pattern` obeys the same rules as a top-level pattern: it must start
    /// with `/`, and `/` alone registers the prefix itself.
    pub fn register_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        if let Err(err) = pattern::normalize(pattern) {
            error!(
                method = %method,
                prefix = %self.prefix,
                pattern = %pattern,
                error_kind = err.kind(),
                error = %err,
                "Route registration failed"
            );
            return Err(err);
        }
        let full = pattern::join(&self.prefix, pattern);
        let mut chain = self.middleware.clone();
        chain.extend(middleware);
        self.router.register_route(method, &full, handler, chain)
    }

    /// Register a `GET` route under this group
    pub fn get(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::GET, pattern, handler, middleware)
    }

    /// Register a `POST` route under this group
    pub fn post(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::POST, pattern, handler, middleware)
    }

    /// Start a nested group
    pub fn group(&mut self, prefix: &str, middleware: Vec<MiddlewareRef>) -> RouteGroup<'_> {
        let mut chain = self.middleware.clone();
        chain.extend(middleware);
        RouteGroup {
            router: &mut *self.router,
            prefix: pattern::join(&self.prefix, prefix),
            middleware: chain,
        }
    }
}
