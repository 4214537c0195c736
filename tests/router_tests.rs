use routetrie::{
    dispatcher::{handler_fn, HandlerRef, HandlerResponse},
    router::{RouteError, RouteMatch, Router},
    runtime_config::RouterConfig,
};

use http::Method;

fn h(name: &str) -> HandlerRef {
    handler_fn(name, |_req| HandlerResponse::json(200, serde_json::Value::Null))
}

fn uncached() -> Router {
    Router::with_config(RouterConfig {
        cache_enabled: false,
        ..RouterConfig::default()
    })
}

/// The "Verb Zoo": one resource registered under every common method
fn zoo_router() -> Router {
    let mut router = Router::new();
    let routes = [
        (Method::GET, "/", "root_handler"),
        (Method::GET, "/zoo/animals", "get_animals"),
        (Method::POST, "/zoo/animals", "create_animal"),
        (Method::GET, "/zoo/animals/:id", "get_animal"),
        (Method::PUT, "/zoo/animals/:id", "update_animal"),
        (Method::PATCH, "/zoo/animals/:id", "patch_animal"),
        (Method::DELETE, "/zoo/animals/:id", "delete_animal"),
        (Method::HEAD, "/zoo/health", "health_check"),
        (Method::OPTIONS, "/zoo/health", "supported_ops"),
        (Method::TRACE, "/zoo/health", "trace_route"),
    ];
    for (method, pattern, handler) in routes {
        router
            .register_route(method, pattern, h(handler), vec![])
            .expect("zoo route registers");
    }
    router
}

fn assert_route_match(router: &Router, method: Method, path: &str, expected_handler: &str) {
    let result = router.find_route(&method, path);
    match result {
        Some(RouteMatch { route, .. }) => {
            assert_eq!(
                route.handler_name, expected_handler,
                "Handler mismatch for {} {}: expected '{}', got '{}'",
                method, path, expected_handler, route.handler_name
            );
        }
        None => {
            assert_eq!(
                expected_handler, "<none>",
                "Expected route to match for {} {}",
                method, path
            );
        }
    }
}

#[test]
fn test_router_verb_zoo() {
    let router = zoo_router();
    assert_route_match(&router, Method::GET, "/", "root_handler");
    assert_route_match(&router, Method::GET, "/zoo/animals", "get_animals");
    assert_route_match(&router, Method::POST, "/zoo/animals", "create_animal");
    assert_route_match(&router, Method::GET, "/zoo/animals/123", "get_animal");
    assert_route_match(&router, Method::PUT, "/zoo/animals/123", "update_animal");
    assert_route_match(&router, Method::PATCH, "/zoo/animals/123", "patch_animal");
    assert_route_match(&router, Method::DELETE, "/zoo/animals/123", "delete_animal");
    assert_route_match(&router, Method::HEAD, "/zoo/health", "health_check");
    assert_route_match(&router, Method::OPTIONS, "/zoo/health", "supported_ops");
    assert_route_match(&router, Method::TRACE, "/zoo/health", "trace_route");
}

#[test]
fn test_router_unknown_path() {
    let router = zoo_router();
    assert_route_match(&router, Method::GET, "/unknown", "<none>");
    assert_route_match(&router, Method::GET, "/zoo/animals/1/legs", "<none>");
    assert_route_match(&router, Method::POST, "/zoo/health", "<none>");
}

#[test]
fn test_static_routes_have_no_params() {
    let router = zoo_router();
    for (method, pattern) in router.routes() {
        if pattern.contains(':') {
            continue;
        }
        let m = router
            .find_route(&method, &pattern)
            .unwrap_or_else(|| panic!("{method} {pattern} should match itself"));
        assert!(m.path_params.is_empty(), "{method} {pattern}");
    }
}

#[test]
fn test_param_capture() {
    let mut router = uncached();
    router.get("/user/:id", h("get_user"), vec![]).unwrap();
    let m = router.find_route(&Method::GET, "/user/42").unwrap();
    assert_eq!(
        m.path_params_map(),
        [("id".to_string(), "42".to_string())].into_iter().collect()
    );
}

#[test]
fn test_wildcard_and_param_siblings_conflict_param_first() {
    let mut router = uncached();
    router.get("/files/:name", h("one"), vec![]).unwrap();
    let err = router.get("/files/*path", h("two"), vec![]).unwrap_err();
    assert!(matches!(err, RouteError::RegistrationConflict { .. }), "{err}");
}

#[test]
fn test_wildcard_and_param_siblings_conflict_wildcard_first() {
    let mut router = uncached();
    router.get("/files/*path", h("one"), vec![]).unwrap();
    let err = router.get("/files/:name", h("two"), vec![]).unwrap_err();
    assert!(matches!(err, RouteError::RegistrationConflict { .. }), "{err}");
}

#[test]
fn test_regex_and_param_siblings_conflict() {
    let mut router = uncached();
    router.get("/items/{id:[0-9]+}", h("one"), vec![]).unwrap();
    assert!(router.get("/items/:id", h("two"), vec![]).is_err());
    assert!(router.get("/items/*rest", h("three"), vec![]).is_err());
}

#[test]
fn test_regex_redefinition_rules() {
    let mut router = uncached();
    router.get("/items/:id([0-9]+)", h("get_item"), vec![]).unwrap();

    // Different name, same expression.
    let err = router.get("/items/:item([0-9]+)/a", h("a"), vec![]).unwrap_err();
    assert!(matches!(err, RouteError::RegistrationConflict { .. }));
    // Same name, different expression.
    let err = router.get("/items/:id([a-z]+)/b", h("b"), vec![]).unwrap_err();
    assert!(matches!(err, RouteError::RegistrationConflict { .. }));

    // Same name and expression, either spelling, extends the existing node.
    router.get("/items/:id([0-9]+)/parts", h("parts"), vec![]).unwrap();
    router.get("/items/{id:[0-9]+}/owners", h("owners"), vec![]).unwrap();
    assert_route_match(&router, Method::GET, "/items/9/parts", "parts");
    assert_route_match(&router, Method::GET, "/items/9/owners", "owners");
}

#[test]
fn test_wildcard_captures_remaining_path() {
    let mut router = uncached();
    router.get("/files/*path", h("files"), vec![]).unwrap();
    let m = router.find_route(&Method::GET, "/files/a/b/c").unwrap();
    assert_eq!(m.get_path_param("path"), Some("a/b/c"));
    assert_eq!(m.path_params.len(), 1);
}

#[test]
fn test_regex_constraint() {
    let mut router = uncached();
    router.get("/{id:[0-9]+}", h("by_id"), vec![]).unwrap();
    assert!(router.find_route(&Method::GET, "/abc").is_none());
    let m = router.find_route(&Method::GET, "/123").unwrap();
    assert_eq!(m.get_path_param("id"), Some("123"));
    // Anchored: a numeric prefix is not enough.
    assert!(router.find_route(&Method::GET, "/123abc").is_none());
}

#[test]
fn test_precedence_static_regex_param() {
    let mut router = uncached();
    router.get("/v/latest", h("latest"), vec![]).unwrap();
    router.get("/v/{n:[0-9]+}", h("numbered"), vec![]).unwrap();
    assert_route_match(&router, Method::GET, "/v/latest", "latest");
    assert_route_match(&router, Method::GET, "/v/12", "numbered");
    assert_route_match(&router, Method::GET, "/v/beta", "<none>");
}

#[test]
fn test_wildcard_terminates_traversal() {
    let mut router = uncached();
    router.get("/static/*file", h("static"), vec![]).unwrap();
    router.get("/static/css/site.css", h("site_css"), vec![]).unwrap();
    assert_route_match(&router, Method::GET, "/static/css/site.css", "site_css");
    // `css` selects the static branch; no backtracking into the wildcard.
    assert_route_match(&router, Method::GET, "/static/css/other.css", "<none>");
    assert_route_match(&router, Method::GET, "/static/js/app.js", "static");
}

#[test]
fn test_malformed_patterns() {
    let mut router = uncached();
    for pattern in ["/a/:id([0-9)", "/a/{id:(}", "/a/*rest/more", "/a/:", "/a/{id"] {
        let err = router.get(pattern, h("bad"), vec![]).unwrap_err();
        assert!(
            matches!(err, RouteError::MalformedPattern { .. }),
            "{pattern}: {err}"
        );
    }
    assert_eq!(router.route_count(), 0);
}

#[test]
fn test_end_to_end_user_routes() {
    let mut router = Router::new();
    router.get("/", h("root"), vec![]).unwrap();
    router.get("/user", h("users"), vec![]).unwrap();
    router.get("/user/:id", h("user"), vec![]).unwrap();
    router.get("/user/:id/profile", h("profile"), vec![]).unwrap();

    let m = router.find_route(&Method::GET, "/user/123/profile").unwrap();
    assert_eq!(m.handler_name(), "profile");
    assert_eq!(
        m.path_params_map(),
        [("id".to_string(), "123".to_string())].into_iter().collect()
    );
    assert!(router.find_route(&Method::DELETE, "/user").is_none());
    assert_route_match(&router, Method::GET, "/", "root");
    assert_route_match(&router, Method::GET, "/user", "users");
    assert_route_match(&router, Method::GET, "/user/7", "user");
}

#[test]
fn test_router_is_shareable_across_threads() {
    let router = std::sync::Arc::new(zoo_router());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let router = std::sync::Arc::clone(&router);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let path = format!("/zoo/animals/{}", t * 1000 + i);
                    let m = router.find_route(&Method::GET, &path).unwrap();
                    assert_eq!(m.handler_name(), "get_animal");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(router.cache_stats().misses, 800);
}
