use super::args::{ArgValue, Args};
use crate::codec::Codec;
use crate::error::BindingError;
use crate::route::{ParameterSpec, Shape, SourceKind};
use crate::server::RequestContext;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves declared parameters against a request.
#[derive(Clone)]
pub struct Binder {
    codec: Arc<dyn Codec>,
}

impl Binder {
    #[must_use]
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Bind every spec in declaration order.
    ///
    /// PATH, QUERY and HEADER values are looked up under
    /// [`ParameterSpec::effective_key`]; an absent or empty value falls back
    /// to the declared default. A required parameter that is still missing
    /// fails the whole binding.
    ///
    /// BODY parameters never fail: an absent, empty or undecodable body binds
    /// `None` even when the parameter is required.
    pub fn bind(&self, specs: &[ParameterSpec], ctx: &RequestContext) -> Result<Args, BindingError> {
        let mut args = Args::new();
        for spec in specs {
            let value = match spec.source {
                SourceKind::Body => self.bind_body(spec, ctx),
                SourceKind::Path | SourceKind::Query | SourceKind::Header => {
                    let key = spec.effective_key();
                    let raw = match spec.source {
                        SourceKind::Path => ctx.path_param(key),
                        SourceKind::Query => ctx.query(key),
                        _ => ctx.header(key),
                    };
                    let resolved = raw
                        .filter(|v| !v.is_empty())
                        .or(spec.default_value.as_deref());
                    match resolved {
                        Some(raw) => Some(self.coerce(raw, spec.shape)),
                        None if spec.required => {
                            debug!(
                                request_id = %ctx.request_id,
                                parameter = %spec.name,
                                key = %key,
                                source = %spec.source,
                                "Required parameter missing"
                            );
                            return Err(BindingError::MissingParameter {
                                key: key.to_string(),
                            });
                        }
                        None => None,
                    }
                }
            };
            args.push(value);
        }
        Ok(args)
    }

    fn bind_body(&self, spec: &ParameterSpec, ctx: &RequestContext) -> Option<ArgValue> {
        let body = ctx.body.as_deref().filter(|b| !b.is_empty())?;
        match self.codec.decode(body, spec.shape) {
            Ok(value) => Some(match spec.shape {
                Shape::Structured => ArgValue::Structured(value),
                shape => match value {
                    Value::String(s) => self.coerce(&s, shape),
                    other => self.coerce(&other.to_string(), shape),
                },
            }),
            Err(e) => {
                warn!(
                    request_id = %ctx.request_id,
                    parameter = %spec.name,
                    error = %e,
                    "Body decode failed, binding none"
                );
                None
            }
        }
    }

    /// Coerce a raw string into `shape`. Never fails: numeric parse failures
    /// yield zero and unparseable booleans yield `false`.
    #[must_use]
    pub fn coerce(&self, raw: &str, shape: Shape) -> ArgValue {
        match shape {
            Shape::String => ArgValue::Str(raw.to_string()),
            Shape::Int => ArgValue::Int(raw.parse().unwrap_or(0)),
            Shape::Long => ArgValue::Long(raw.parse().unwrap_or(0)),
            Shape::Double => ArgValue::Double(raw.parse().unwrap_or(0.0)),
            Shape::Bool => ArgValue::Bool(raw.parse().unwrap_or(false)),
            Shape::Structured => ArgValue::Structured(
                self.codec
                    .decode(raw.as_bytes(), Shape::Structured)
                    .unwrap_or_else(|_| Value::String(raw.to_string())),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use http::Method;
    use serde_json::json;

    fn binder() -> Binder {
        Binder::new(Arc::new(JsonCodec))
    }

    #[test]
    fn test_coercion_falls_back_to_zero() {
        let b = binder();
        assert_eq!(b.coerce("12", Shape::Int), ArgValue::Int(12));
        assert_eq!(b.coerce("abc", Shape::Int), ArgValue::Int(0));
        assert_eq!(b.coerce("3000000000", Shape::Int), ArgValue::Int(0));
        assert_eq!(b.coerce("3000000000", Shape::Long), ArgValue::Long(3_000_000_000));
        assert_eq!(b.coerce("1.5", Shape::Double), ArgValue::Double(1.5));
        assert_eq!(b.coerce("nope", Shape::Double), ArgValue::Double(0.0));
        assert_eq!(b.coerce("true", Shape::Bool), ArgValue::Bool(true));
        assert_eq!(b.coerce("yes", Shape::Bool), ArgValue::Bool(false));
    }

    #[test]
    fn test_structured_from_query_string() {
        let b = binder();
        assert_eq!(
            b.coerce("{\"a\":1}", Shape::Structured),
            ArgValue::Structured(json!({"a": 1}))
        );
        assert_eq!(
            b.coerce("plain", Shape::Structured),
            ArgValue::Structured(json!("plain"))
        );
    }

    #[test]
    fn test_empty_value_uses_default() {
        let ctx = RequestContext::new(Method::GET, "/calc?a=");
        let spec = ParameterSpec::query("a").shape(Shape::Int).default_value("9");
        let args = binder().bind(&[spec], &ctx).unwrap();
        assert_eq!(args.int(0), Some(9));
    }

    #[test]
    fn test_scalar_body() {
        let ctx = RequestContext::new(Method::POST, "/n").with_body("41");
        let spec = ParameterSpec::body("n").shape(Shape::Long);
        let args = binder().bind(&[spec], &ctx).unwrap();
        assert_eq!(args.long(0), Some(41));
    }
}
