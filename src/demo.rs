//! Demonstration controller served by `laneway serve`.
//!
//! | Route | Lane | Handler |
//! |---|---|---|
//! | `GET /` | io | `home` |
//! | `GET /users/{id}` | io | `get_user` |
//! | `POST /users` | io | `create_user` |
//! | `GET /calc?a=&b=` | cpu | `calculate` |
//! | `GET /health` | io | `health` |
//! | `GET /info` | io | `info` (reads `User-Agent`) |

use crate::binder::Args;
use crate::dispatcher::{Controller, Failure};
use crate::error::ManifestError;
use crate::registry::HandlerRegistry;
use crate::route::{RouteDescriptor, RouteManifest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Route manifest for the demo controller.
pub const DEMO_MANIFEST: &str = include_str!("../config/demo_routes.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcResult {
    pub a: i32,
    pub b: i32,
    pub result: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[derive(Debug, Default)]
pub struct DemoController;

impl DemoController {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn home(&self, _args: &Args) -> anyhow::Result<Value> {
        Ok(Value::String("Welcome to Laneway!".to_string()))
    }

    pub fn get_user(&self, args: &Args) -> anyhow::Result<Value> {
        let user = User {
            id: args.str(0).unwrap_or_default().to_string(),
            name: "John Doe".to_string(),
            email: "john.doe@example.com".to_string(),
        };
        Ok(serde_json::to_value(user)?)
    }

    pub fn create_user(&self, args: &Args) -> anyhow::Result<Value> {
        let user: User = args
            .deserialize(0)?
            .ok_or_else(|| Failure::new(400, "Request body required"))?;
        let created = User {
            id: (now_millis() % 10_000).to_string(),
            ..user
        };
        Ok(serde_json::to_value(created)?)
    }

    /// Deliberately CPU heavy: a million wrapping multiply-adds.
    pub fn calculate(&self, args: &Args) -> anyhow::Result<Value> {
        let a = args.int(0).unwrap_or(0);
        let b = args.int(1).unwrap_or(0);
        let product = a.wrapping_mul(b);
        let result = (0..1_000_000i32).fold(0i32, |acc, i| acc.wrapping_add(product.wrapping_add(i)));
        Ok(serde_json::to_value(CalcResult { a, b, result })?)
    }

    pub fn health(&self, _args: &Args) -> anyhow::Result<Value> {
        Ok(serde_json::to_value(HealthStatus {
            status: "UP".to_string(),
            timestamp: now_millis(),
        })?)
    }

    pub fn info(&self, args: &Args) -> anyhow::Result<Value> {
        Ok(Value::String(format!(
            "User-Agent: {}",
            args.str(0).unwrap_or_default()
        )))
    }
}

/// Registry of the demo handlers, all sharing one lazily built controller.
#[must_use]
pub fn demo_registry() -> HandlerRegistry {
    let controller = Controller::new(DemoController::new);
    let mut registry = HandlerRegistry::new();
    registry
        .register("home", controller.route(DemoController::home))
        .register("get_user", controller.route(DemoController::get_user))
        .register("create_user", controller.route(DemoController::create_user))
        .register("calculate", controller.route(DemoController::calculate))
        .register("health", controller.route(DemoController::health))
        .register("info", controller.route(DemoController::info));
    registry
}

/// The demo manifest resolved against `registry`.
///
/// # Errors
///
/// The registry lacks one of the demo handler names.
pub fn demo_routes(registry: &HandlerRegistry) -> Result<Vec<RouteDescriptor>, ManifestError> {
    RouteManifest::from_yaml(DEMO_MANIFEST)?.resolve(registry)
}
