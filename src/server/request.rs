use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info, warn};

/// Decoded inbound request.
///
/// Built once per request at the transport boundary. The pipeline fills in
/// `path_params` while resolving the route; after that the context is only
/// read.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method
    pub method: Method,
    /// Request path, never containing a query string
    pub path: String,
    /// Header names kept exactly as supplied by the transport
    pub headers: HashMap<String, String>,
    /// Percent-decoded query parameters; the last duplicate wins
    pub query_params: HashMap<String, String>,
    /// Placeholder bindings from the matched route
    pub path_params: HashMap<String, String>,
    /// Raw body bytes, if any
    pub body: Option<Vec<u8>>,
    /// Value of the `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Correlation id for logs
    pub request_id: RequestId,
}

impl RequestContext {
    /// Build a context from a method and raw request target (`/path?query`).
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            headers: HashMap::new(),
            query_params: query.map(parse_query_string).unwrap_or_default(),
            path_params: HashMap::new(),
            body: None,
            content_type: None,
            request_id: RequestId::new(),
        }
    }

    /// Add a header. `Content-Type` and `X-Request-Id` are recognised
    /// regardless of case.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.insert_header(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("content-type") && self.content_type.is_none() {
            self.content_type = Some(value.to_string());
        }
        if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
            self.request_id = RequestId::from_header_or_new(Some(value));
        }
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Header lookup by exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Parse a raw query string (without the leading `?`).
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Decode a `may_minihttp` request into a [`RequestContext`].
///
/// Fails only when the method is not a valid HTTP token.
pub fn parse_request(req: Request) -> Result<RequestContext, http::method::InvalidMethod> {
    let method = Method::from_bytes(req.method().as_bytes())?;
    let mut ctx = RequestContext::new(method, req.path());

    for h in req.headers().iter() {
        ctx.insert_header(h.name, &String::from_utf8_lossy(h.value));
    }
    debug!(
        request_id = %ctx.request_id,
        header_count = ctx.headers.len(),
        query_count = ctx.query_params.len(),
        "Headers and query extracted"
    );

    let mut body = Vec::new();
    match req.body().read_to_end(&mut body) {
        Ok(0) => {}
        Ok(size) => {
            debug!(
                request_id = %ctx.request_id,
                body_size_bytes = size,
                content_type = ?ctx.content_type,
                "Request body read"
            );
            ctx.body = Some(body);
        }
        Err(e) => warn!(
            request_id = %ctx.request_id,
            error = %e,
            "Failed to read request body, treating as absent"
        ),
    }

    info!(
        request_id = %ctx.request_id,
        method = %ctx.method,
        path = %ctx.path,
        "HTTP request parsed"
    );
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_split_at_first_question_mark() {
        let ctx = RequestContext::new(Method::GET, "/calc?a=1&b=x?y");
        assert_eq!(ctx.path, "/calc");
        assert_eq!(ctx.query("a"), Some("1"));
        assert_eq!(ctx.query("b"), Some("x?y"));
    }

    #[test]
    fn test_query_percent_decoded_last_wins() {
        let q = parse_query_string("name=John%20Doe&x=1&x=2");
        assert_eq!(q.get("name").map(String::as_str), Some("John Doe"));
        assert_eq!(q.get("x").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_content_type_any_case() {
        let ctx = RequestContext::new(Method::POST, "/users")
            .with_header("content-TYPE", "application/json");
        assert_eq!(ctx.content_type.as_deref(), Some("application/json"));
        assert_eq!(ctx.header("content-TYPE"), Some("application/json"));
        assert_eq!(ctx.header("Content-Type"), None);
    }
}
