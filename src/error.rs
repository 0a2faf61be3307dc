//! Error taxonomy for the dispatch pipeline.
//!
//! Every error that can happen while serving a request is converted into a
//! [`Failure`](crate::dispatcher::Failure) at the boundary where it occurs and
//! then flows through response assembly like any other outcome. The enums here
//! carry enough context for logs; [`DispatchError::status`] decides the HTTP
//! status the client sees.

use http::Method;
use thiserror::Error;

use crate::route::Shape;

/// Route registration failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Patterns must be absolute (`/...`).
    #[error("path pattern '{pattern}' must start with '/'")]
    NotAbsolute {
        /// The offending pattern
        pattern: String,
    },
    /// `{}` has no name to bind.
    #[error("path pattern '{pattern}' contains an empty placeholder")]
    EmptyPlaceholder {
        /// The offending pattern
        pattern: String,
    },
}

/// A required parameter could not be resolved from the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// No value, no default, and the parameter is required.
    #[error("Missing required parameter '{key}'")]
    MissingParameter {
        /// Effective lookup key (declared key, or the parameter name)
        key: String,
    },
}

impl BindingError {
    /// The lookup key that failed to resolve.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            BindingError::MissingParameter { key } => key,
        }
    }
}

/// Failures reported by a [`Codec`](crate::codec::Codec).
#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes could not be parsed into the requested shape.
    #[error("cannot decode body as {shape}: {source}")]
    Decode {
        /// Target shape requested by the binder
        shape: Shape,
        /// Underlying parser error
        #[source]
        source: serde_json::Error,
    },
    /// The value could not be serialized.
    #[error("cannot encode value: {0}")]
    Encode(String),
}

/// Route manifest could not be turned into descriptors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A route references a handler name nobody registered.
    #[error("route {method} {path} references unknown handler '{handler}'")]
    UnknownHandler {
        /// Declared method
        method: String,
        /// Declared path pattern
        path: String,
        /// Handler name that failed to resolve
        handler: String,
    },
    /// The method is not a valid HTTP token.
    #[error("route {path} has invalid method '{method}'")]
    InvalidMethod {
        /// Declared method
        method: String,
        /// Declared path pattern
        path: String,
    },
    /// The path pattern is malformed.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// The manifest is not valid YAML for the expected schema.
    #[error("invalid route manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The manifest file could not be read.
    #[error("cannot read route manifest: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised inside the request pipeline, before a handler produced a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No route for this verb + path.
    #[error("Not Found")]
    RouteNotFound {
        /// Request method as received
        method: String,
        /// Request path (no query string)
        path: String,
    },
    /// Parameter binding failed.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// The handler returned an error or panicked.
    #[error("{0}")]
    HandlerFailure(String),
    /// A lane could not accept the task.
    #[error("{lane} lane unavailable: {reason}")]
    LaneUnavailable {
        /// `io` or `cpu`
        lane: &'static str,
        /// What went wrong
        reason: String,
    },
    /// The transport gave up waiting on the outcome.
    #[error("request to {method} {path} timed out")]
    Timeout {
        /// Request method
        method: Method,
        /// Request path
        path: String,
    },
}

impl DispatchError {
    /// HTTP status for this error class.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::RouteNotFound { .. } => 404,
            DispatchError::Binding(_) => 400,
            DispatchError::HandlerFailure(_) => 500,
            DispatchError::LaneUnavailable { .. } => 503,
            DispatchError::Timeout { .. } => 504,
        }
    }
}
