use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hook pair wrapped around a handler invocation.
///
/// `before` runs outermost-first and may short-circuit by returning a response;
/// `after` runs innermost-first with the final response and the elapsed time.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}

    /// Name used in diagnostics (CLI output, debug logs)
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared middleware reference, as bound to tree nodes
pub type MiddlewareRef = Arc<dyn Middleware>;

/// Ordered middleware list
pub type MiddlewareVec = Vec<MiddlewareRef>;

/// Append `from` to `chain`, skipping instances already present.
///
/// Identity is `Arc` pointer identity, so the first (outermost) position wins.
pub(crate) fn extend_unique(chain: &mut MiddlewareVec, from: &[MiddlewareRef]) {
    for mw in from {
        if !chain.iter().any(|existing| Arc::ptr_eq(existing, mw)) {
            chain.push(Arc::clone(mw));
        }
    }
}
