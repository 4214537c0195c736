//! # Middleware Module
//!
//! Middleware comes from three places: server-global (registered on the
//! [`Router`](crate::router::Router)), route groups, and individual routes.
//! Group and route middleware are flattened into the per-node list at
//! registration time; lookups concatenate those lists root→leaf.
//!
//! Execution order for one request is fixed:
//!
//! ```text
//! global → group → route → handler → route → group → global
//! ```
//!
//! [`MiddlewareChain`] is the executor for that order.

mod chain;
mod core;
mod metrics;
mod tracing;

pub use chain::MiddlewareChain;
pub use core::{Middleware, MiddlewareRef, MiddlewareVec};
pub(crate) use core::extend_unique;
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
