// Performance-focused tests for router scalability
//
// Lookups walk one node per path segment, so their cost must not grow with
// the number of registered routes.

use super::Router;
use crate::dispatcher::{handler_fn, HandlerRef, HandlerResponse};
use crate::runtime_config::RouterConfig;
use http::Method;
use std::time::Instant;

fn h(name: &str) -> HandlerRef {
    handler_fn(name, |_req| HandlerResponse::json(200, serde_json::Value::Null))
}

fn router_with_routes(count: usize, cache_enabled: bool) -> Router {
    let mut router = Router::with_config(RouterConfig {
        cache_enabled,
        ..RouterConfig::default()
    });
    for i in 0..count {
        router
            .get(&format!("/api/v1/resource{i}/:id"), h(&format!("handler_{i}")), vec![])
            .unwrap();
        router
            .get(&format!("/api/v1/resource{i}/:id/items/*rest"), h(&format!("items_{i}")), vec![])
            .unwrap();
    }
    router
}

#[test]
fn test_router_performance_with_many_routes() {
    let router = router_with_routes(500, false);

    let start = Instant::now();
    for _ in 0..1000 {
        let result = router.find_route(&Method::GET, "/api/v1/resource250/123");
        assert!(result.is_some());
    }
    let duration = start.elapsed();

    assert!(
        duration.as_millis() < 50,
        "Router performance degraded: {}ms for 1000 lookups with 1000 routes",
        duration.as_millis()
    );
}

#[test]
fn test_deep_paths_stay_linear() {
    let mut router = router_with_routes(0, false);
    let deep: String = (0..200).map(|i| format!("/s{i}")).collect();
    router.get(&deep, h("deep"), vec![]).unwrap();
    router.get("/files/*path", h("files"), vec![]).unwrap();

    assert_eq!(router.find_route(&Method::GET, &deep).unwrap().handler_name(), "deep");

    let long_tail: String = (0..10_000).map(|i| format!("/p{i}")).collect();
    let m = router
        .find_route(&Method::GET, &format!("/files{long_tail}"))
        .unwrap();
    assert_eq!(m.get_path_param("path").map(str::len), Some(long_tail.len() - 1));
}

#[test]
fn test_cache_serves_repeat_lookups() {
    let router = router_with_routes(100, true);
    for i in 0..50 {
        let path = format!("/api/v1/resource{i}/{i}/items/a/b");
        assert!(router.find_route(&Method::GET, &path).is_some());
        assert!(router.find_route(&Method::GET, &path).is_some());
    }
    let stats = router.cache_stats();
    assert_eq!(stats.misses, 50);
    assert_eq!(stats.hits, 50);
    assert_eq!(stats.size, 50);
}
