#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end pipeline tests over the demo routes, without a socket.

use http::Method;
use laneway::dispatcher::handler_fn;
use laneway::route::RouteDescriptor;
use laneway::router::RouteTable;
use laneway::server::{DispatchService, Phase, RequestContext, RequestStats};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::test_server::{demo_service, test_dispatcher};

#[test]
fn test_health_is_up() {
    let reply = demo_service().serve(RequestContext::new(Method::GET, "/health"));
    assert_eq!(reply.status, 200);
    assert_eq!(reply.content_type(), Some("application/json"));
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["status"], "UP");
    assert!(body["timestamp"].as_u64().unwrap() > 0);
}

#[test]
fn test_path_parameter_reaches_handler() {
    let reply = demo_service().serve(RequestContext::new(Method::GET, "/users/42"));
    assert_eq!(reply.status, 200);
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["id"], "42");
    assert_eq!(body["name"], "John Doe");
}

#[test]
fn test_unknown_route_is_404() {
    let service = demo_service();
    for (method, path) in [(Method::GET, "/nope"), (Method::DELETE, "/users/42"), (Method::GET, "/users/")] {
        let reply = service.serve(RequestContext::new(method, path));
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body_text(), r#"{"error":"Not Found"}"#);
    }
}

#[test]
fn test_string_result_is_text_plain() {
    let reply = demo_service().serve(RequestContext::new(Method::GET, "/"));
    assert_eq!(reply.status, 200);
    assert_eq!(reply.content_type(), Some("text/plain"));
    assert_eq!(reply.body_text(), "Welcome to Laneway!");
    assert_eq!(reply.header("content-length"), Some("19"));
}

#[test]
fn test_post_json_body_round_trip() {
    let ctx = RequestContext::new(Method::POST, "/users")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"name":"Ada","email":"ada@example.com"}"#);
    let reply = demo_service().serve(ctx);
    assert_eq!(reply.status, 200);
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["email"], "ada@example.com");
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[test]
fn test_post_without_body_reaches_handler() {
    let reply = demo_service().serve(RequestContext::new(Method::POST, "/users"));
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body_text(), r#"{"error":"Request body required"}"#);
}

#[test]
fn test_missing_query_parameter_is_400() {
    let reply = demo_service().serve(RequestContext::new(Method::GET, "/calc?a=3"));
    assert_eq!(reply.status, 400);
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body, json!({"error": "Missing required parameter 'b'"}));
}

#[test]
fn test_cpu_route_computes() {
    let reply = demo_service().serve(RequestContext::new(Method::GET, "/calc?a=3&b=4"));
    assert_eq!(reply.status, 200);
    let body: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body["a"], 3);
    assert_eq!(body["b"], 4);
}

#[test]
fn test_header_parameter() {
    let ctx = RequestContext::new(Method::GET, "/info").with_header("User-Agent", "curl/8.4");
    let reply = demo_service().serve(ctx);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body_text(), "User-Agent: curl/8.4");
}

#[test]
fn test_pending_response_phases() {
    let service = demo_service();

    let pending = service.handle(RequestContext::new(Method::GET, "/users/7"));
    assert_eq!(pending.phase(), Phase::Dispatching);
    assert_eq!(pending.wait().status, 200);

    let missing = service.handle(RequestContext::new(Method::GET, "/missing"));
    assert_eq!(missing.phase(), Phase::Assembling);

    let unbound = service.handle(RequestContext::new(Method::GET, "/calc"));
    assert_eq!(unbound.phase(), Phase::Assembling);
    assert_eq!(unbound.wait().status, 400);
}

#[test]
fn test_request_id_is_propagated() {
    let ctx = RequestContext::new(Method::GET, "/health")
        .with_header("X-Request-Id", "01ARZ3NDEKTSV4RRFFQ69G5FAV");
    let pending = demo_service().handle(ctx);
    assert_eq!(pending.request_id().to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV");
}

#[test]
fn test_wait_timeout_within_deadline() {
    let reply = demo_service()
        .handle(RequestContext::new(Method::GET, "/health"))
        .wait_timeout(Duration::from_secs(5));
    assert_eq!(reply.status, 200);
}

#[test]
fn test_slow_handler_times_out_with_504() {
    let table = RouteTable::new();
    table
        .register(
            RouteDescriptor::new(
                Method::GET,
                "/slow",
                handler_fn(|_| {
                    std::thread::sleep(Duration::from_millis(200));
                    Ok(json!("done"))
                }),
            )
            .cpu_bound(),
        )
        .unwrap();
    let service = DispatchService::with_json(Arc::new(table), test_dispatcher(1));

    let reply = service
        .handle(RequestContext::new(Method::GET, "/slow"))
        .wait_timeout(Duration::from_millis(20));
    assert_eq!(reply.status, 504);
    assert!(reply.body_text().contains("timed out"));
}

#[test]
fn test_request_counters_track_lifecycle() {
    let service = demo_service();
    let shared = service.clone();
    assert_eq!(service.stats(), RequestStats::default());

    let pending = service.handle(RequestContext::new(Method::GET, "/users/1"));
    let abandoned = shared.handle(RequestContext::new(Method::GET, "/missing"));
    assert_eq!(service.stats(), RequestStats { total: 2, active: 2 });

    assert_eq!(pending.wait().status, 200);
    drop(abandoned);
    assert_eq!(shared.stats(), RequestStats { total: 2, active: 0 });
}
