//! YAML route manifests.
//!
//! A manifest declares routes by handler *name*. It is resolved against a
//! [`HandlerRegistry`] exactly once at startup, producing the finished list of
//! [`RouteDescriptor`]s. Nothing is looked up by name on the request path.

use super::types::{ParameterSpec, RouteDescriptor, Shape, SourceKind, WorkloadClass};
use crate::error::ManifestError;
use crate::registry::HandlerRegistry;
use crate::router::PathPattern;
use http::Method;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

fn default_true() -> bool {
    true
}

/// One parameter entry in a manifest route.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestParam {
    pub name: String,
    pub source: SourceKind,
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub shape: Option<Shape>,
}

impl From<&ManifestParam> for ParameterSpec {
    fn from(p: &ManifestParam) -> Self {
        let shape = p.shape.unwrap_or(match p.source {
            SourceKind::Body => Shape::Structured,
            _ => Shape::String,
        });
        ParameterSpec {
            name: p.name.clone(),
            source: p.source,
            lookup_key: p.key.clone(),
            required: p.required,
            default_value: p.default.clone(),
            shape,
        }
    }
}

/// One route entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestRoute {
    pub method: String,
    pub path: String,
    pub handler: String,
    #[serde(default)]
    pub workload: WorkloadClass,
    #[serde(default)]
    pub params: Vec<ManifestParam>,
}

/// Parsed manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: Vec<ManifestRoute>,
}

impl RouteManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Bind every route to its registered handler.
    ///
    /// Fails on the first unknown handler, invalid method, or malformed path
    /// pattern; a manifest is either fully valid or rejected.
    pub fn resolve(&self, registry: &HandlerRegistry) -> Result<Vec<RouteDescriptor>, ManifestError> {
        let mut descriptors = Vec::with_capacity(self.routes.len());
        for route in &self.routes {
            let method = Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())
                .map_err(|_| ManifestError::InvalidMethod {
                    method: route.method.clone(),
                    path: route.path.clone(),
                })?;
            PathPattern::parse(&route.path)?;

            let handler = registry.get(&route.handler).ok_or_else(|| {
                ManifestError::UnknownHandler {
                    method: route.method.clone(),
                    path: route.path.clone(),
                    handler: route.handler.clone(),
                }
            })?;

            debug!(
                method = %method,
                path = %route.path,
                handler_name = %route.handler,
                workload = %route.workload,
                params = route.params.len(),
                "Manifest route resolved"
            );

            descriptors.push(
                RouteDescriptor::new(method, &route.path, handler)
                    .named(&route.handler)
                    .params(route.params.iter().map(ParameterSpec::from).collect())
                    .workload(route.workload),
            );
        }
        info!(routes_count = descriptors.len(), "Route manifest resolved");
        Ok(descriptors)
    }
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<RouteManifest, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    RouteManifest::from_yaml(&content)
}
