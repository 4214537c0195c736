//! Router facade - the hot path for request routing.
//!
//! [`Router`] composes the per-method [`RouteTree`](super::radix) with an optional
//! [`AdaptiveRouteCache`]. Registration happens through `&mut self` during
//! startup; lookups take `&self` and are safe to run from any number of threads.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use arc_swap::ArcSwapOption;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Span};

use super::error::RouteError;
use super::group::RouteGroup;
use super::pattern;
use super::radix::RouteTree;
use crate::cache::{AdaptiveRouteCache, CacheStats};
use crate::dispatcher::{HandlerRef, HandlerRequest, HandlerResponse};
use crate::middleware::{MiddlewareChain, MiddlewareRef, MiddlewareVec};
use crate::runtime_config::RouterConfig;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/:id/posts/:post_id).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the route tree (known at
/// startup) and cloning is an atomic increment. Values are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Metadata of a registered route, stored on its terminal node
#[derive(Clone)]
pub struct RouteMeta {
    /// HTTP method the route was registered for
    pub method: Method,
    /// Full normalized pattern, e.g. `/user/:id/profile`
    pub path_pattern: String,
    /// Name of the handler, used in logs and metrics
    pub handler_name: String,
    /// The handler itself
    pub handler: HandlerRef,
}

impl fmt::Debug for RouteMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMeta")
            .field("method", &self.method)
            .field("path_pattern", &self.path_pattern)
            .field("handler_name", &self.handler_name)
            .finish_non_exhaustive()
    }
}

/// Result of successfully matching a request path to a route
///
/// Immutable once built; the cache hands out clones.
#[derive(Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: Arc<RouteMeta>,
    /// Path parameters captured during traversal, in path order
    pub path_params: ParamVec,
    /// Middleware collected root→leaf, each instance at most once
    pub middleware: MiddlewareVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: if duplicate parameter names exist
    /// at different path depths (e.g., `/org/:id/user/:id`), returns the last
    /// occurrence.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap
    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Name of the matched handler
    #[inline]
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.route.handler_name
    }

    /// Names of the resolved middleware, outermost first
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&str> {
        self.middleware.iter().map(|mw| mw.name()).collect()
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", &self.route)
            .field("path_params", &self.path_params)
            .field("middleware", &self.middleware_names())
            .finish()
    }
}

/// Router that matches HTTP requests to handlers
///
/// Lookups probe the adaptive cache first (when enabled) and fall back to an
/// O(segments) tree walk. Every log event is emitted inside the span passed
/// to [`Router::with_span`], so callers decide where router logs go.
///
/// ```rust
/// use http::Method;
/// use routetrie::dispatcher::{handler_fn, HandlerResponse};
/// use routetrie::router::Router;
///
/// let mut router = Router::new();
/// router
///     .get("/user/:id", handler_fn("get_user", |_req| HandlerResponse::json(200, serde_json::json!({}))), vec![])
///     .unwrap();
///
/// let m = router.find_route(&Method::GET, "/user/42").unwrap();
/// assert_eq!(m.get_path_param("id"), Some("42"));
/// assert!(router.find_route(&Method::DELETE, "/user/42").is_none());
/// ```
pub struct Router {
    tree: RouteTree,
    /// Registered routes in registration order
    routes: Vec<Arc<RouteMeta>>,
    /// Server-global middleware, outermost in every chain
    global: MiddlewareVec,
    cache: ArcSwapOption<AdaptiveRouteCache>,
    config: RouterConfig,
    span: Span,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create a router with the default configuration (cache enabled)
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Create a router from an explicit configuration
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        let cache = config
            .cache_enabled
            .then(|| Arc::new(AdaptiveRouteCache::new(config.cache.clone())));
        Self {
            tree: RouteTree::new(),
            routes: Vec::new(),
            global: MiddlewareVec::new(),
            cache: ArcSwapOption::new(cache),
            config,
            span: Span::none(),
        }
    }

    /// Emit all router log events inside `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Router configuration in effect
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register a route.
    ///
    /// The pattern is fully validated before the tree is touched; on error the
    /// tree is left exactly as it was. Errors indicate a bug in the route table
    /// and are expected to abort startup.
    pub fn register_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        let _enter = self.span.enter();
        let result = pattern::parse(pattern).and_then(|parsed| {
            self.tree
                .insert(method.clone(), &parsed, handler, middleware)
        });

        match result {
            Ok(meta) => {
                info!(
                    method = %meta.method,
                    pattern = %meta.path_pattern,
                    handler_name = %meta.handler_name,
                    "Route registered"
                );
                self.routes.push(meta);
                // Cached matches may be shadowed by the new route.
                if let Some(cache) = self.cache.load_full() {
                    cache.clear();
                }
                Ok(())
            }
            Err(err) => {
                error!(
                    method = %method,
                    pattern = %pattern,
                    error_kind = err.kind(),
                    error = %err,
                    "Route registration failed"
                );
                Err(err)
            }
        }
    }

    /// Register a `GET` route
    pub fn get(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::GET, pattern, handler, middleware)
    }

    /// Register a `POST` route
    pub fn post(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::POST, pattern, handler, middleware)
    }

    /// Register a `PUT` route
    pub fn put(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::PUT, pattern, handler, middleware)
    }

    /// Register a `DELETE` route
    pub fn delete(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::DELETE, pattern, handler, middleware)
    }

    /// Register a `PATCH` route
    pub fn patch(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<(), RouteError> {
        self.register_route(Method::PATCH, pattern, handler, middleware)
    }

    /// Start a route group under `prefix` with shared middleware
    pub fn group(&mut self, prefix: &str, middleware: Vec<MiddlewareRef>) -> RouteGroup<'_> {
        RouteGroup::new(self, prefix.to_string(), middleware)
    }

    /// Append server-global middleware.
    ///
    /// Global middleware wraps every dispatched request, outside any group or
    /// route middleware. It is not stored in the tree.
    pub fn use_middleware(&mut self, middleware: MiddlewareRef) {
        self.global.push(middleware);
    }

    /// Server-global middleware, outermost first
    #[must_use]
    pub fn global_middleware(&self) -> &[MiddlewareRef] {
        &self.global
    }

    /// Resolve `path` for `method`.
    ///
    /// `None` is the ordinary "no route" outcome (respond 404), never an error.
    /// `path` must already be percent-decoded and stripped of its query string.
    #[must_use]
    pub fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let _enter = self.span.enter();
        let guard = self.cache.load();
        let cache: &Option<Arc<AdaptiveRouteCache>> = &guard;
        let cache = cache.as_ref();

        let key = cache.map(|_| cache_key(method, path));
        if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
            if let Some(hit) = cache.get(key) {
                debug!(
                    method = %method,
                    path = %path,
                    handler_name = %hit.route.handler_name,
                    "Route cache hit"
                );
                return Some(hit);
            }
        }

        let match_start = Instant::now();
        let result = self.tree.find(method, path);
        let match_duration = match_start.elapsed();

        let Some(found) = result else {
            debug!(
                method = %method,
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            );
            return None;
        };

        if match_duration > self.config.slow_match_threshold {
            warn!(
                method = %method,
                path = %path,
                handler_name = %found.route.handler_name,
                route_pattern = %found.route.path_pattern,
                path_params = ?found.path_params,
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            );
        } else {
            debug!(
                method = %method,
                path = %path,
                handler_name = %found.route.handler_name,
                route_pattern = %found.route.path_pattern,
                path_params = ?found.path_params,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }

        if let (Some(cache), Some(key)) = (cache, key) {
            cache.set(key, found.clone(), match_duration);
        }
        Some(found)
    }

    /// Route `req` and run it through its middleware chain and handler.
    ///
    /// Chain order, outermost first: global middleware, then the node-collected
    /// chain (group before route-specific), then the handler. Returns `None`
    /// when no route matches.
    #[must_use]
    pub fn dispatch(&self, mut req: HandlerRequest) -> Option<HandlerResponse> {
        let RouteMatch {
            route,
            path_params,
            middleware,
        } = self.find_route(&req.method, &req.path)?;

        req.handler_name.clone_from(&route.handler_name);
        req.path_params = path_params;

        let _enter = self.span.enter();
        let chain = MiddlewareChain::new(&self.global, &middleware);
        let start = Instant::now();
        let resp = chain.run(&req, route.handler.as_ref());
        debug!(
            method = %req.method,
            path = %req.path,
            handler_name = %route.handler_name,
            middleware = ?chain.names(),
            status = resp.status,
            latency_us = start.elapsed().as_micros(),
            "Request dispatched"
        );
        Some(resp)
    }

    /// Enable the lookup cache with `max_size` entries.
    ///
    /// Replaces (and closes) any cache already in place. Other settings come
    /// from the router's cache configuration. A zero size is corrected to the
    /// default.
    pub fn enable_cache(&self, max_size: usize) {
        let _enter = self.span.enter();
        let mut config = self.config.cache.clone();
        config.max_size = max_size;
        let cache = Arc::new(AdaptiveRouteCache::new(config));
        info!(max_size = cache.config().max_size, "Route cache enabled");
        if let Some(old) = self.cache.swap(Some(cache)) {
            old.close();
        }
    }

    /// Disable the lookup cache, dropping every entry.
    ///
    /// Lookups keep working through the tree.
    pub fn disable_cache(&self) {
        let _enter = self.span.enter();
        if let Some(old) = self.cache.swap(None) {
            old.close();
            info!("Route cache disabled");
        }
    }

    /// Whether the lookup cache is enabled
    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.cache.load().is_some()
    }

    /// Cache counters; all zero while the cache is disabled
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        let guard = self.cache.load();
        let cache: &Option<Arc<AdaptiveRouteCache>> = &guard;
        cache.as_ref().map(|c| c.stats()).unwrap_or_default()
    }

    /// Registered `(method, pattern)` pairs in registration order
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|meta| (meta.method.clone(), meta.path_pattern.clone()))
            .collect()
    }

    /// Number of registered routes
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Log the routing table at INFO
    ///
    /// Useful for debugging and verifying that routes are loaded correctly.
    pub fn dump_routes(&self) {
        let _enter = self.span.enter();
        info!(
            routes_count = self.routes.len(),
            global_middleware = self.global.len(),
            cache_enabled = self.cache_enabled(),
            "Routing table"
        );
        for meta in &self.routes {
            info!(
                method = %meta.method,
                pattern = %meta.path_pattern,
                handler_name = %meta.handler_name,
                "Route"
            );
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("global_middleware", &self.global.len())
            .field("cache_enabled", &self.cache_enabled())
            .finish_non_exhaustive()
    }
}

fn cache_key(method: &Method, path: &str) -> String {
    let method = method.as_str();
    let mut key = String::with_capacity(method.len() + path.len() + 1);
    key.push_str(method);
    key.push(' ');
    key.push_str(path);
    key
}
