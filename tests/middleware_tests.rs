use routetrie::{
    dispatcher::{handler_fn, HandlerRef, HandlerRequest, HandlerResponse},
    middleware::{Middleware, MiddlewareRef, MetricsMiddleware, TracingMiddleware},
    router::Router,
};

use http::Method;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

/// Records `before:`/`after:` events and optionally answers early
struct Recorder {
    label: &'static str,
    log: Log,
    reject_with: Option<u16>,
}

impl Middleware for Recorder {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.log.lock().unwrap().push(format!("before:{}", self.label));
        self.reject_with
            .map(|status| HandlerResponse::error(status, "rejected"))
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        self.log.lock().unwrap().push(format!("after:{}", self.label));
        res.set_header("x-seen-by", self.label.to_string());
    }

    fn name(&self) -> &str {
        self.label
    }
}

fn recorder(label: &'static str, log: &Log) -> MiddlewareRef {
    Arc::new(Recorder {
        label,
        log: Arc::clone(log),
        reject_with: None,
    })
}

fn rejecting(label: &'static str, log: &Log, status: u16) -> MiddlewareRef {
    Arc::new(Recorder {
        label,
        log: Arc::clone(log),
        reject_with: Some(status),
    })
}

fn logging_handler(name: &str, log: &Log) -> HandlerRef {
    let log = Arc::clone(log);
    handler_fn(name, move |req| {
        log.lock().unwrap().push("handler".to_string());
        HandlerResponse::json(
            200,
            serde_json::json!({ "id": req.get_path_param("id") }),
        )
    })
}

fn events(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_global_group_route_order() {
    let log: Log = Arc::default();
    let mut router = Router::new();
    router.use_middleware(recorder("global", &log));
    router
        .group("/api", vec![recorder("group", &log)])
        .get(
            "/users/:id",
            logging_handler("get_user", &log),
            vec![recorder("route", &log)],
        )
        .unwrap();

    let resp = router
        .dispatch(HandlerRequest::new(Method::GET, "/api/users/7"))
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["id"], "7");
    // Outermost `after` runs last and wins the header.
    assert_eq!(resp.get_header("x-seen-by"), Some("global"));
    assert_eq!(
        events(&log),
        vec![
            "before:global",
            "before:group",
            "before:route",
            "handler",
            "after:route",
            "after:group",
            "after:global",
        ]
    );
}

#[test]
fn test_match_reports_collected_middleware() {
    let log: Log = Arc::default();
    let mut router = Router::new();
    {
        let mut admin = router.group("/admin", vec![recorder("auth", &log)]);
        admin
            .get("/stats", logging_handler("stats", &log), vec![recorder("audit", &log)])
            .unwrap();
    }
    let m = router.find_route(&Method::GET, "/admin/stats").unwrap();
    assert_eq!(m.middleware_names(), vec!["auth", "audit"]);
}

#[test]
fn test_short_circuit_skips_handler_and_inner_layers() {
    let log: Log = Arc::default();
    let mut router = Router::new();
    router.use_middleware(recorder("outer", &log));
    router
        .get(
            "/secret",
            logging_handler("secret", &log),
            vec![rejecting("auth", &log, 401), recorder("inner", &log)],
        )
        .unwrap();

    let resp = router
        .dispatch(HandlerRequest::new(Method::GET, "/secret"))
        .unwrap();
    assert_eq!(resp.status, 401);
    assert_eq!(
        events(&log),
        vec!["before:outer", "before:auth", "after:auth", "after:outer"]
    );
}

#[test]
fn test_shared_instance_runs_once() {
    let log: Log = Arc::default();
    let shared = recorder("shared", &log);
    let mut router = Router::new();
    router
        .group("/g", vec![Arc::clone(&shared)])
        .get("/x", logging_handler("x", &log), vec![shared])
        .unwrap();

    let m = router.find_route(&Method::GET, "/g/x").unwrap();
    assert_eq!(m.middleware_names(), vec!["shared"]);
    router.dispatch(HandlerRequest::new(Method::GET, "/g/x")).unwrap();
    assert_eq!(events(&log), vec!["before:shared", "handler", "after:shared"]);
}

#[test]
fn test_unmatched_dispatch_runs_nothing() {
    let log: Log = Arc::default();
    let mut router = Router::new();
    router.use_middleware(recorder("global", &log));
    router.get("/a", logging_handler("a", &log), vec![]).unwrap();
    assert!(router.dispatch(HandlerRequest::new(Method::GET, "/b")).is_none());
    assert!(events(&log).is_empty());
}

#[test]
fn test_metrics_middleware_counts_dispatches() {
    let metrics = Arc::new(MetricsMiddleware::new());
    let mut router = Router::new();
    router.use_middleware(Arc::clone(&metrics) as MiddlewareRef);
    router.use_middleware(Arc::new(TracingMiddleware));
    router
        .get(
            "/pets/:id",
            handler_fn("get_pet", |_req| {
                HandlerResponse::json(200, serde_json::json!({ "name": "Rex" }))
            }),
            vec![],
        )
        .unwrap();
    router
        .get(
            "/boom",
            handler_fn("boom", |_req| HandlerResponse::error(500, "boom")),
            vec![],
        )
        .unwrap();

    for id in ["1", "2", "3"] {
        let resp = router
            .dispatch(HandlerRequest::new(Method::GET, format!("/pets/{id}")))
            .unwrap();
        assert_eq!(resp.status, 200);
    }
    let resp = router.dispatch(HandlerRequest::new(Method::GET, "/boom")).unwrap();
    assert_eq!(resp.status, 500);

    assert_eq!(metrics.request_count(), 4);
    assert_eq!(metrics.error_responses(), 1);
    let pets = metrics.handler_metrics("get_pet").unwrap();
    assert_eq!(pets.requests, 3);
    assert_eq!(pets.errors, 0);
    let boom = metrics.handler_metrics("boom").unwrap();
    assert_eq!((boom.requests, boom.errors), (1, 1));
    assert!(metrics.handler_metrics("missing").is_none());
}

#[test]
fn test_dispatch_fills_request_from_match() {
    let mut router = Router::new();
    router
        .get(
            "/files/*path",
            handler_fn("files", |req| {
                HandlerResponse::json(
                    200,
                    serde_json::json!({
                        "handler": req.handler_name,
                        "path": req.get_path_param("path"),
                    }),
                )
            }),
            vec![],
        )
        .unwrap();
    let resp = router
        .dispatch(HandlerRequest::new(Method::GET, "/files/docs/readme.md"))
        .unwrap();
    assert_eq!(resp.body["handler"], "files");
    assert_eq!(resp.body["path"], "docs/readme.md");
}
