//! Name -> handler registry used to resolve route manifests at startup.

use crate::dispatcher::{handler_fn, HandlerRef};
use crate::binder::Args;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerRef>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, handler: HandlerRef) -> &mut Self {
        if self.handlers.insert(name.to_string(), handler).is_some() {
            warn!(handler_name = %name, "Handler re-registered - replacing previous");
        } else {
            debug!(handler_name = %name, "Handler registered");
        }
        self
    }

    /// Register a closure.
    pub fn register_fn<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&Args) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register(name, handler_fn(f))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<HandlerRef> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
