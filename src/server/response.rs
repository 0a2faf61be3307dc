//! Response assembly: [`Outcome`] -> status, headers and body.
//!
//! This is the only place user-visible response text is produced. Every
//! failure, whichever phase it came from, leaves as `{"error": "<message>"}`.

use crate::codec::Codec;
use crate::dispatcher::{Failure, Outcome};
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::warn;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Maximum number of response headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 4;

/// Response headers. Names are fixed at compile time.
pub type HeaderVec = SmallVec<[(&'static str, String); MAX_INLINE_HEADERS]>;

/// Assembled response ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Header value by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Body as UTF-8, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builds [`HttpReply`]s from outcomes using the injected codec.
#[derive(Clone)]
pub struct ResponseAssembler {
    codec: Arc<dyn Codec>,
}

impl ResponseAssembler {
    #[must_use]
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }

    /// Convert an outcome. Never fails.
    ///
    /// - string value: `text/plain`, the string verbatim, 200
    /// - any other value: codec-encoded, 200; if encoding fails, the JSON
    ///   envelope `{"data": "<value as text>"}`
    /// - failure: `{"error": message}` with the failure's status
    #[must_use]
    pub fn assemble(&self, outcome: Outcome) -> HttpReply {
        match outcome {
            Outcome::Value(Value::String(s)) => reply(200, TEXT_PLAIN, s.into_bytes()),
            Outcome::Value(value) => match self.codec.encode(&value) {
                Ok(body) => reply(200, self.codec.content_type(), body),
                Err(e) => {
                    warn!(error = %e, "Response encoding failed, using text envelope");
                    let envelope = json!({ "data": value.to_string() });
                    reply(200, APPLICATION_JSON, envelope.to_string().into_bytes())
                }
            },
            Outcome::Failure(failure) => error_reply(&failure),
        }
    }
}

fn error_reply(failure: &Failure) -> HttpReply {
    let body = json!({ "error": failure.message }).to_string().into_bytes();
    reply(failure.status, APPLICATION_JSON, body)
}

fn reply(status: u16, content_type: &str, body: Vec<u8>) -> HttpReply {
    let mut headers = HeaderVec::new();
    headers.push(("Content-Type", content_type.to_string()));
    headers.push(("Content-Length", body.len().to_string()));
    HttpReply {
        status,
        headers,
        body,
    }
}

/// Canonical reason phrase.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
