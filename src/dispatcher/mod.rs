//! # Dispatcher Module
//!
//! Types shared between the router and the (external) request-serving layer:
//!
//! - [`HandlerRequest`] - decoded method/path plus headers, query and body
//! - [`HandlerResponse`] - status, headers and JSON body
//! - [`Handler`] - the callable bound to a route's terminal node
//!
//! ## Request Flow
//!
//! 1. The transport layer builds a `HandlerRequest`
//! 2. [`Router::dispatch`](crate::router::Router::dispatch) resolves the route
//!    (cache first, then tree traversal) and fills in path parameters
//! 3. Global middleware, then the node-collected chain, then the handler run
//! 4. The response is handed back to the transport layer
//!
//! A lookup miss is returned as `None`; answering 404 is the caller's decision.

mod core;

pub use core::{
    handler_fn, Handler, HandlerRef, HandlerRequest, HandlerResponse, HeaderVec,
    MAX_INLINE_HEADERS,
};
