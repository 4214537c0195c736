//! # routetrie
//!
//! **routetrie** is the request-routing core of an HTTP service: a per-method
//! segment trie that resolves a method and decoded path to a handler, its path
//! parameters and its middleware chain, fronted by an adaptive lookup cache.
//!
//! ## Overview
//!
//! The library is organized into a few modules:
//!
//! - **[`router`]** - Pattern parsing, the routing tree, conflict detection and the [`Router`] facade
//! - **[`cache`]** - [`AdaptiveRouteCache`](cache::AdaptiveRouteCache) with weighted eviction and a background sweeper
//! - **[`middleware`]** - The [`Middleware`](middleware::Middleware) trait, chain execution and built-in metrics/tracing middleware
//! - **[`dispatcher`]** - Handler-facing request/response types and the [`Handler`](dispatcher::Handler) trait
//! - **[`runtime_config`]** - Environment and TOML configuration
//! - **[`logging`]** - `tracing-subscriber` setup for binaries
//! - **[`cli`]** - The `routetrie` command-line tool
//!
//! ### Request Flow
//!
//! ```text
//! dispatcher ──► Router::find_route ──► AdaptiveRouteCache::get ──hit──► RouteMatch
//!                                           │ miss
//!                                           ▼
//!                                  RouteTree walk (static > regex > param > wildcard)
//!                                           │
//!                                           ▼
//!                          AdaptiveRouteCache::set(key, match, latency) ──► RouteMatch
//! ```
//!
//! [`Router::dispatch`](router::Router::dispatch) then runs the chain: global
//! middleware outermost, then group middleware, then route middleware, then
//! the handler.
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use routetrie::dispatcher::{handler_fn, HandlerRequest, HandlerResponse};
//! use routetrie::Router;
//!
//! let mut router = Router::new();
//! router
//!     .get(
//!         "/user/:id/profile",
//!         handler_fn("profile", |req| {
//!             HandlerResponse::json(200, serde_json::json!({ "id": req.get_path_param("id") }))
//!         }),
//!         vec![],
//!     )
//!     .expect("valid route");
//!
//! let resp = router
//!     .dispatch(HandlerRequest::new(Method::GET, "/user/123/profile"))
//!     .expect("route matches");
//! assert_eq!(resp.body["id"], "123");
//!
//! // Second lookup of the same path is served from the cache.
//! let _ = router.find_route(&Method::GET, "/user/123/profile");
//! assert_eq!(router.cache_stats().hits, 1);
//! ```
//!
//! ## Concurrency
//!
//! Registration takes `&mut Router` and happens before serving. Once built,
//! the tree is read-only; `find_route` and `dispatch` take `&self` and can be
//! called from any number of threads. The cache is the only shared mutable
//! state and is guarded by a reader-writer lock.

pub mod cache;
pub mod cli;
pub mod dispatcher;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;

pub use cache::{AdaptiveRouteCache, CacheStats};
pub use router::{RouteError, RouteGroup, RouteMatch, Router};
pub use runtime_config::{CacheConfig, RouterConfig};
