use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::core::MiddlewareRef;
use crate::dispatcher::{Handler, HandlerRequest, HandlerResponse};

/// Resolved, ordered middleware stack for one request.
///
/// Layers are stored outermost first: server-global middleware, then the
/// node-collected chain of the matched route. A middleware instance appears at
/// most once; a global instance that is also bound to a route keeps its global
/// (outer) position.
pub struct MiddlewareChain<'a> {
    layers: SmallVec<[&'a MiddlewareRef; 8]>,
}

impl<'a> MiddlewareChain<'a> {
    /// Build a chain from global middleware and a route's resolved chain
    #[must_use]
    pub fn new(global: &'a [MiddlewareRef], route: &'a [MiddlewareRef]) -> Self {
        let mut layers: SmallVec<[&'a MiddlewareRef; 8]> = SmallVec::new();
        for mw in global.iter().chain(route.iter()) {
            if !layers.iter().any(|existing| Arc::ptr_eq(*existing, mw)) {
                layers.push(mw);
            }
        }
        Self { layers }
    }

    /// Number of layers in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain has no layers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names, outermost first
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(|mw| mw.name()).collect()
    }

    /// Run the chain around `handler`.
    ///
    /// `before` hooks run outermost first. The first hook returning a response
    /// short-circuits: the handler and the remaining inner layers are skipped,
    /// and only the layers already entered (including the one that answered)
    /// see `after`, innermost first.
    pub fn run(&self, req: &HandlerRequest, handler: &dyn Handler) -> HandlerResponse {
        let start = Instant::now();
        let mut entered = 0;
        let mut early = None;

        for mw in &self.layers {
            entered += 1;
            if let Some(resp) = mw.before(req) {
                debug!(
                    middleware_name = mw.name(),
                    depth = entered,
                    status = resp.status,
                    "Middleware returned early response"
                );
                early = Some(resp);
                break;
            }
        }

        let mut resp = match early {
            Some(resp) => resp,
            None => handler.call(req),
        };
        let latency = start.elapsed();

        for mw in self.layers[..entered].iter().rev() {
            mw.after(req, &mut resp, latency);
        }
        resp
    }
}
