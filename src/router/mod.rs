//! # Router Module
//!
//! The router module resolves an HTTP method and decoded path to a registered
//! handler, its captured path parameters and its middleware chain.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Validating route patterns and rejecting conflicting registrations
//! - Matching incoming requests with fixed, non-backtracking precedence
//! - Extracting path parameters from matched routes
//! - Collecting the middleware bound along the matched branch
//! - Memoizing hot lookups in an [`AdaptiveRouteCache`](crate::cache::AdaptiveRouteCache)
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Registration**: At startup, each pattern (e.g., `/user/:id/profile`) is
//!    parsed and validated in full, checked for conflicts against the tree, and
//!    only then inserted. Regex segments are compiled once here.
//!
//! 2. **Matching**: For each request the cache is probed first; on a miss the
//!    method's tree is walked one segment at a time (static, then regex, then
//!    parameter, then wildcard) and the result is cached with its lookup latency.
//!
//! ## Pattern syntax
//!
//! | Form          | Meaning                                          |
//! |---------------|--------------------------------------------------|
//! | `literal`     | exact static segment                             |
//! | `:name`       | parameter, captures one segment                  |
//! | `{name}`      | parameter, brace spelling                        |
//! | `:name(expr)` | parameter constrained by a regular expression    |
//! | `{name:expr}` | same, brace spelling                             |
//! | `*name`       | trailing wildcard, captures the rest of the path |
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use routetrie::dispatcher::{handler_fn, HandlerResponse};
//! use routetrie::router::Router;
//!
//! let mut router = Router::new();
//! let ok = |name: &str| handler_fn(name, |_req| HandlerResponse::json(200, serde_json::Value::Null));
//! router.get("/files/*path", ok("files"), vec![]).unwrap();
//! router.get("/items/{id:[0-9]+}", ok("item"), vec![]).unwrap();
//!
//! let m = router.find_route(&Method::GET, "/files/a/b/c").unwrap();
//! assert_eq!(m.get_path_param("path"), Some("a/b/c"));
//! assert!(router.find_route(&Method::GET, "/items/abc").is_none());
//! ```
//!
//! ## Performance
//!
//! - Matching is O(segments), independent of the number of routes
//! - Parameters are stored inline for up to [`MAX_INLINE_PARAMS`] captures
//! - The tree is read-only after startup and needs no locking

mod core;
mod error;
mod group;
mod pattern;
mod radix;
#[cfg(test)]
mod performance_tests;

pub use core::{ParamVec, RouteMatch, RouteMeta, Router, MAX_INLINE_PARAMS};
pub use error::RouteError;
pub use group::RouteGroup;
