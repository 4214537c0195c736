use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Per-handler counters
#[derive(Debug, Default)]
struct HandlerCounters {
    requests: AtomicUsize,
    errors: AtomicUsize,
    total_latency_ns: AtomicU64,
}

/// Point-in-time view of one handler's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandlerMetrics {
    /// Requests that reached this handler's chain
    pub requests: usize,
    /// Responses with status >= 500
    pub errors: usize,
    /// Mean time spent inside the chain
    pub average_latency: Duration,
}

/// Middleware for collecting request metrics
///
/// Tracks request counts, latency and error responses. Global counters are
/// plain atomics; per-handler counters live in a `DashMap` keyed by handler
/// name so concurrent requests to different routes never contend on one lock.
///
/// Metrics collected:
/// - Total request count
/// - Average latency (request processing time)
/// - Error response count (status >= 500)
/// - Per-handler request/error/latency counters
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    error_responses: AtomicUsize,
    per_handler: DashMap<String, HandlerCounters>,
}

/// Default initialization for metrics middleware
///
/// Creates a new instance with all counters set to zero.
impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            error_responses: AtomicUsize::new(0),
            per_handler: DashMap::new(),
        }
    }
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Number of responses with a 5xx status
    #[must_use]
    pub fn error_responses(&self) -> usize {
        self.error_responses.load(Ordering::Relaxed)
    }

    /// Counters for one handler, if it has served any request
    #[must_use]
    pub fn handler_metrics(&self, handler_name: &str) -> Option<HandlerMetrics> {
        self.per_handler.get(handler_name).map(|c| {
            let requests = c.requests.load(Ordering::Relaxed);
            let total = c.total_latency_ns.load(Ordering::Relaxed);
            HandlerMetrics {
                requests,
                errors: c.errors.load(Ordering::Relaxed),
                average_latency: if requests == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_nanos(total / requests as u64)
                },
            }
        })
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if let Some(c) = self.per_handler.get(req.handler_name.as_str()) {
            c.requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.per_handler
                .entry(req.handler_name.clone())
                .or_default()
                .requests
                .fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        let is_error = res.status >= 500;
        if is_error {
            self.error_responses.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(c) = self.per_handler.get(req.handler_name.as_str()) {
            c.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
            if is_error {
                c.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn name(&self) -> &str {
        "metrics"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn request(handler: &str) -> HandlerRequest {
        let mut req = HandlerRequest::new(Method::GET, "/x");
        req.handler_name = handler.to_string();
        req
    }

    #[test]
    fn test_zero_requests() {
        let metrics = MetricsMiddleware::new();
        assert_eq!(metrics.request_count(), 0);
        assert_eq!(metrics.average_latency(), Duration::ZERO);
        assert!(metrics.handler_metrics("missing").is_none());
    }

    #[test]
    fn test_counts_per_handler() {
        let metrics = MetricsMiddleware::new();
        let req = request("get_user");
        for status in [200, 500, 200] {
            assert!(metrics.before(&req).is_none());
            let mut res = HandlerResponse::json(status, serde_json::Value::Null);
            metrics.after(&req, &mut res, Duration::from_micros(10));
        }
        assert_eq!(metrics.request_count(), 3);
        assert_eq!(metrics.error_responses(), 1);
        assert_eq!(metrics.average_latency(), Duration::from_micros(10));

        let per = metrics.handler_metrics("get_user").unwrap();
        assert_eq!(per.requests, 3);
        assert_eq!(per.errors, 1);
        assert_eq!(per.average_latency, Duration::from_micros(10));
    }
}
