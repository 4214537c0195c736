//! Handler-facing request/response types and the [`Handler`] trait.
//!
//! The transport layer builds a [`HandlerRequest`] from an already-decoded method
//! and path; the router fills in path parameters and runs the resolved middleware
//! chain around the matched handler.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::router::ParamVec;

/// Maximum inline headers before heap allocation
/// Most requests have ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` because they repeat across requests
/// (Content-Type, Authorization, ...) and cloning is an atomic increment.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data passed through middleware into a handler
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path, already percent-decoded and stripped of its query string
    pub path: String,
    /// Name of the handler that will process this request (filled in on match)
    pub handler_name: String,
    /// Path parameters extracted from the URL (filled in on match)
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl HandlerRequest {
    /// Create a bare request for `method` and `path`
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler_name: String::new(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Add a header (builder style)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    /// Attach a JSON body (builder style)
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics if the same name was captured twice.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name ("last write wins")
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to HashMap
    /// Note: This allocates - use get_path_param() in hot paths
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Response produced by a handler or a short-circuiting middleware
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Request handler bound to a route's terminal node
pub trait Handler: Send + Sync {
    /// Process a request whose path parameters are already populated
    fn call(&self, req: &HandlerRequest) -> HandlerResponse;

    /// Name used in logs and diagnostics
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handler reference as stored in the routing tree
pub type HandlerRef = Arc<dyn Handler>;

struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync,
{
    fn call(&self, req: &HandlerRequest) -> HandlerResponse {
        (self.f)(req)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a named handler
///
/// ```rust
/// use routetrie::dispatcher::{handler_fn, Handler, HandlerResponse};
///
/// let h = handler_fn("health", |_req| HandlerResponse::json(200, serde_json::json!("ok")));
/// assert_eq!(h.name(), "health");
/// ```
pub fn handler_fn<F>(name: &str, f: F) -> HandlerRef
where
    F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
{
    Arc::new(FnHandler {
        name: name.to_string(),
        f,
    })
}

impl fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("name", &self.name()).finish()
    }
}
