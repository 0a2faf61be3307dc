//! # Route Module
//!
//! Route descriptors and the declarations they are built from.
//!
//! A [`RouteDescriptor`] binds an HTTP verb and a path pattern (`/users/{id}`)
//! to an already-resolved [`HandlerRef`](crate::dispatcher::HandlerRef), the
//! ordered [`ParameterSpec`]s the handler expects, and the
//! [`WorkloadClass`] that picks its execution lane. Descriptors are built in
//! code or resolved from a YAML [`manifest`] at startup.

pub mod manifest;
mod types;

pub use manifest::{load_manifest, RouteManifest};
pub use types::*;
