use std::time::Duration;

use tracing::{debug, info, warn};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Logs request start and completion with structured fields.
///
/// Completion is logged at INFO, or WARN for 5xx responses.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            method = %req.method,
            path = %req.path,
            handler = %req.handler_name,
            path_params = ?req.path_params,
            "Request start"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        if res.status >= 500 {
            warn!(
                method = %req.method,
                path = %req.path,
                handler = %req.handler_name,
                status = res.status,
                latency_us,
                "Request failed"
            );
        } else {
            info!(
                method = %req.method,
                path = %req.path,
                handler = %req.handler_name,
                status = res.status,
                latency_us,
                "Request complete"
            );
        }
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
