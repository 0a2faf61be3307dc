use super::pipeline::DispatchService;
use super::request::parse_request;
use super::response::{status_reason, HttpReply, APPLICATION_JSON, TEXT_PLAIN};
use crate::dispatcher::{Failure, Outcome};
use may_minihttp::{HttpService, Request, Response};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

/// `may_minihttp` adapter around a [`DispatchService`].
///
/// Each connection gets its own clone; all clones share the pipeline.
#[derive(Clone)]
pub struct AppService {
    pipeline: DispatchService,
    request_timeout: Option<Duration>,
}

impl AppService {
    #[must_use]
    pub fn new(pipeline: DispatchService) -> Self {
        Self {
            pipeline,
            request_timeout: None,
        }
    }

    /// Answer 504 when a handler has not finished within `timeout`.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pipeline(&self) -> &DispatchService {
        &self.pipeline
    }
}

/// Header lines for codec content types other than the two built-in ones.
/// Leaked once per distinct type, never per request.
static CONTENT_TYPE_LINES: Lazy<Mutex<HashMap<String, &'static str>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// `res.header` needs a `'static` line, so known content types map to literals.
fn content_type_line(content_type: &str) -> &'static str {
    match content_type {
        TEXT_PLAIN => "Content-Type: text/plain",
        APPLICATION_JSON => "Content-Type: application/json",
        other => {
            let mut lines = CONTENT_TYPE_LINES
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *lines
                .entry(other.to_string())
                .or_insert_with(|| Box::leak(format!("Content-Type: {other}").into_boxed_str()))
        }
    }
}

/// Copy an assembled reply onto the wire response.
///
/// `may_minihttp` derives `Content-Length` from the body it is given, which
/// is the same body the assembler measured, so that header is not repeated.
pub fn write_reply(res: &mut Response, reply: HttpReply) {
    res.status_code(reply.status as usize, status_reason(reply.status));
    if let Some(ct) = reply.content_type() {
        res.header(content_type_line(ct));
    }
    res.body_vec(reply.body);
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let ctx = match parse_request(req) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(error = %e, "Rejecting request with invalid method");
                let reply = self
                    .pipeline
                    .assembler()
                    .assemble(Outcome::Failure(Failure::new(400, "Invalid method")));
                write_reply(res, reply);
                return Ok(());
            }
        };

        let pending = self.pipeline.handle(ctx);
        let reply = match self.request_timeout {
            Some(timeout) => pending.wait_timeout(timeout),
            None => pending.wait(),
        };
        write_reply(res, reply);
        Ok(())
    }
}
