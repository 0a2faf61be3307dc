#![allow(dead_code)]

pub mod test_server {
    use laneway::demo::{demo_registry, demo_routes};
    use laneway::dispatcher::{Dispatcher, LaneConfig};
    use laneway::router::RouteTable;
    use laneway::server::DispatchService;
    use std::sync::{Arc, Once};

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Lanes sized for tests: a small CPU pool and the test stack size.
    pub fn test_dispatcher(cpu_workers: usize) -> Arc<Dispatcher> {
        setup_may_runtime();
        Arc::new(
            Dispatcher::new(LaneConfig {
                cpu_workers,
                io_stack_size: 0x8000,
            })
            .expect("lanes should start"),
        )
    }

    /// Pipeline over the demo manifest and handlers.
    pub fn demo_service() -> DispatchService {
        let routes = demo_routes(&demo_registry()).expect("demo manifest resolves");
        let table = RouteTable::from_descriptors(routes).expect("demo routes are valid");
        DispatchService::with_json(Arc::new(table), test_dispatcher(2))
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw request and read until the server closes the connection.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set timeout");
        stream.write_all(req.as_bytes()).expect("write request");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if response_complete(&buf) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn response_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        buf.len() >= header_end + 4 + content_length
    }

    /// Split a raw response into (status, body).
    pub fn parse_response(resp: &str) -> (u16, String) {
        let status = resp
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let body = resp
            .split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
        (status, body)
    }
}
