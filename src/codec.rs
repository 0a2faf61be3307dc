//! Body codec boundary.
//!
//! The binder decodes request bodies through a [`Codec`] and the response
//! assembler encodes handler values through the same trait, so the wire
//! format is injectable. [`JsonCodec`] is the default.

use crate::error::CodecError;
use crate::route::Shape;
use serde_json::Value;

/// Decode request bytes and encode response values.
pub trait Codec: Send + Sync {
    /// Parse `bytes` into a value of `shape`.
    ///
    /// Scalar shapes accept either the JSON scalar (`42`, `true`) or a JSON
    /// string holding it (`"42"`). Structured accepts any document.
    fn decode(&self, bytes: &[u8], shape: Shape) -> Result<Value, CodecError>;

    /// Serialize a value to bytes.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// `Content-Type` of [`Codec::encode`] output.
    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// `serde_json` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, bytes: &[u8], shape: Shape) -> Result<Value, CodecError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|source| CodecError::Decode { shape, source })?;
        let fits = match shape {
            Shape::Structured => true,
            Shape::String => value.is_string(),
            Shape::Int | Shape::Long => value.is_i64() || value.is_u64() || value.is_string(),
            Shape::Double => value.is_number() || value.is_string(),
            Shape::Bool => value.is_boolean() || value.is_string(),
        };
        if fits {
            Ok(value)
        } else {
            let source: serde_json::Error =
                serde::de::Error::custom(format!("expected {shape}, found {value}"));
            Err(CodecError::Decode { shape, source })
        }
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_round_trip() {
        let codec = JsonCodec;
        let value = json!({"id": 1, "tags": ["a", "b"]});
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes, Shape::Structured).unwrap(), value);
    }

    #[test]
    fn test_shape_mismatch_is_decode_error() {
        let err = JsonCodec.decode(b"{\"a\":1}", Shape::Int).unwrap_err();
        assert!(matches!(err, CodecError::Decode { shape: Shape::Int, .. }));
    }

    #[test]
    fn test_invalid_json() {
        assert!(JsonCodec.decode(b"{not json", Shape::Structured).is_err());
    }
}
