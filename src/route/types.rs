use crate::dispatcher::HandlerRef;
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Path,
    Query,
    Header,
    Body,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Path => write!(f, "Path"),
            SourceKind::Query => write!(f, "Query"),
            SourceKind::Header => write!(f, "Header"),
            SourceKind::Body => write!(f, "Body"),
        }
    }
}

/// Semantic type a bound argument is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    String,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    Double,
    Bool,
    /// Any JSON-compatible structure, passed through from the codec untouched
    Structured,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Shape::String => "string",
            Shape::Int => "int",
            Shape::Long => "long",
            Shape::Double => "double",
            Shape::Bool => "bool",
            Shape::Structured => "structured",
        };
        write!(f, "{s}")
    }
}

/// Execution lane a route runs on. Fixed at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadClass {
    /// Short, frequently-blocking work: one coroutine per invocation
    #[default]
    Io,
    /// Compute-bound work: fixed pool of OS threads
    Cpu,
}

impl WorkloadClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadClass::Io => "io",
            WorkloadClass::Cpu => "cpu",
        }
    }
}

impl fmt::Display for WorkloadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared handler parameter.
///
/// `lookup_key` may be empty, in which case the declared `name` is used to
/// look the value up in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub source: SourceKind,
    pub lookup_key: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub shape: Shape,
}

impl ParameterSpec {
    /// A required string parameter read from `source` under `name`.
    #[must_use]
    pub fn new(name: &str, source: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            source,
            lookup_key: String::new(),
            required: true,
            default_value: None,
            shape: Shape::String,
        }
    }

    #[must_use]
    pub fn path(name: &str) -> Self {
        Self::new(name, SourceKind::Path)
    }

    #[must_use]
    pub fn query(name: &str) -> Self {
        Self::new(name, SourceKind::Query)
    }

    #[must_use]
    pub fn header(name: &str) -> Self {
        Self::new(name, SourceKind::Header)
    }

    /// Body parameters default to the structured shape.
    #[must_use]
    pub fn body(name: &str) -> Self {
        Self::new(name, SourceKind::Body).shape(Shape::Structured)
    }

    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.lookup_key = key.to_string();
        self
    }

    #[must_use]
    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// Key used against the request: `lookup_key`, or `name` when empty.
    #[inline]
    #[must_use]
    pub fn effective_key(&self) -> &str {
        if self.lookup_key.is_empty() {
            &self.name
        } else {
            &self.lookup_key
        }
    }
}

/// A registered route: verb + pattern bound to a handler and its parameters.
///
/// Immutable once handed to the [`RouteTable`](crate::router::RouteTable).
#[derive(Clone)]
pub struct RouteDescriptor {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
    pub handler: HandlerRef,
    pub parameters: Vec<ParameterSpec>,
    pub workload: WorkloadClass,
}

impl RouteDescriptor {
    /// New IO-lane route with no parameters. `handler_name` defaults to the pattern.
    #[must_use]
    pub fn new(method: Method, path_pattern: &str, handler: HandlerRef) -> Self {
        Self {
            method,
            path_pattern: path_pattern.to_string(),
            handler_name: path_pattern.to_string(),
            handler,
            parameters: Vec::new(),
            workload: WorkloadClass::Io,
        }
    }

    #[must_use]
    pub fn named(mut self, handler_name: &str) -> Self {
        self.handler_name = handler_name.to_string();
        self
    }

    #[must_use]
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    #[must_use]
    pub fn params(mut self, specs: Vec<ParameterSpec>) -> Self {
        self.parameters = specs;
        self
    }

    #[must_use]
    pub fn workload(mut self, class: WorkloadClass) -> Self {
        self.workload = class;
        self
    }

    #[must_use]
    pub fn cpu_bound(self) -> Self {
        self.workload(WorkloadClass::Cpu)
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path_pattern", &self.path_pattern)
            .field("handler_name", &self.handler_name)
            .field("parameters", &self.parameters)
            .field("workload", &self.workload)
            .finish_non_exhaustive()
    }
}
