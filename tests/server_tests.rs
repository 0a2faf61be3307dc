#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Integration tests over a real socket.
//!
//! Starts the demo routes behind `may_minihttp` on a free local port and
//! talks raw HTTP/1.1 to it, so the transport adapter is covered along with
//! the pipeline.

use laneway::server::{AppService, HttpServer, ServerHandle};
use serde_json::Value;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

mod common;
use common::http::{parse_response, send_request};
use common::test_server::demo_service;

/// Server fixture, stopped on drop.
struct DemoServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl DemoServer {
    fn start() -> Self {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let service = AppService::new(demo_service()).with_request_timeout(Some(Duration::from_secs(5)));
        let handle = HttpServer(service).start(("127.0.0.1", port)).unwrap();
        handle.wait_ready().unwrap();
        let addr = handle.addr();
        Self {
            handle: Some(handle),
            addr,
        }
    }

    fn get(&self, path: &str) -> (u16, String) {
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nUser-Agent: laneway-test\r\n\r\n");
        parse_response(&send_request(&self.addr, &req))
    }
}

impl Drop for DemoServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_server_routes_requests() {
    let server = DemoServer::start();

    let (status, body) = server.get("/health");
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "UP");

    let (status, body) = server.get("/users/42");
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["id"], "42");

    let (status, body) = server.get("/info");
    assert_eq!(status, 200);
    assert_eq!(body, "User-Agent: laneway-test");
}

#[test]
fn test_server_not_found_and_bad_request() {
    let server = DemoServer::start();

    let (status, body) = server.get("/does/not/exist");
    assert_eq!(status, 404);
    assert_eq!(body, r#"{"error":"Not Found"}"#);

    let (status, body) = server.get("/calc?a=1");
    assert_eq!(status, 400);
    assert_eq!(body, r#"{"error":"Missing required parameter 'b'"}"#);
}

#[test]
fn test_server_post_json() {
    let server = DemoServer::start();
    let payload = r#"{"name":"Grace","email":"grace@example.com"}"#;
    let req = format!(
        "POST /users HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        payload.len(),
        payload
    );
    let resp = send_request(&server.addr, &req);
    assert!(resp.to_ascii_lowercase().contains("content-type: application/json"));
    let (status, body) = parse_response(&resp);
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "Grace");
}
