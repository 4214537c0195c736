use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use routetrie::dispatcher::{handler_fn, HandlerRef, HandlerResponse};
use routetrie::{Router, RouterConfig};
use std::hint::black_box;

fn h(name: &str) -> HandlerRef {
    handler_fn(name, |_req| HandlerResponse::json(200, serde_json::Value::Null))
}

/// The "Verb Zoo" route table plus a few deep parameterised routes
fn zoo_router(cache_enabled: bool) -> Router {
    let mut router = Router::with_config(RouterConfig {
        cache_enabled,
        ..RouterConfig::default()
    });
    let routes = [
        (Method::GET, "/", "root_handler"),
        (Method::GET, "/zoo/animals", "get_animals"),
        (Method::POST, "/zoo/animals", "create_animal"),
        (Method::GET, "/zoo/animals/:id", "get_animal"),
        (Method::PUT, "/zoo/animals/:id", "update_animal"),
        (Method::PATCH, "/zoo/animals/:id", "patch_animal"),
        (Method::DELETE, "/zoo/animals/:id", "delete_animal"),
        (Method::GET, "/zoo/animals/:id/toys/:toy_id", "animal_toy"),
        (
            Method::GET,
            "/zoo/:category/animals/:id/habitats/:habitat_id/sections/:section_id",
            "habitat_section",
        ),
        (
            Method::POST,
            "/inventory/:warehouse_id/feeds/:feed_id/items/:item_id/batches/{batch_id:[0-9]+}",
            "post_item_batch",
        ),
        (Method::GET, "/complex/:a/:b/:c/:d/:e/:f/:g/:h/:i", "complex_many_params"),
        (Method::GET, "/static/*file", "static_files"),
        (Method::HEAD, "/zoo/health", "health_check"),
    ];
    for (method, pattern, handler) in routes {
        router
            .register_route(method, pattern, h(handler), vec![])
            .expect("valid route");
    }
    router
}

fn bench_route_throughput(c: &mut Criterion) {
    let test_paths = [
        (Method::GET, "/zoo/animals/123"),
        (Method::GET, "/zoo/animals/123/toys/456"),
        (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
        (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
        (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
        (Method::GET, "/static/css/site/main.css"),
    ];

    let uncached = zoo_router(false);
    c.bench_function("route_match_uncached", |b| {
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                black_box(uncached.find_route(method, path));
            }
        })
    });

    let cached = zoo_router(true);
    c.bench_function("route_match_cached", |b| {
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                black_box(cached.find_route(method, path));
            }
        })
    });

    c.bench_function("route_miss", |b| {
        b.iter(|| black_box(uncached.find_route(&Method::GET, "/zoo/unknown/path")))
    });
}

criterion_group!(benches, bench_route_throughput);
criterion_main!(benches);
