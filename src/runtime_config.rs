//! # Runtime Configuration Module
//!
//! Server and lane settings, layered from lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. an optional YAML file
//! 3. `LANEWAY_*` environment variables
//! 4. command-line flags
//!
//! ## Environment Variables
//!
//! | Variable | Field | Notes |
//! |---|---|---|
//! | `LANEWAY_HOST` | `host` | |
//! | `LANEWAY_PORT` | `port` | |
//! | `LANEWAY_CPU_WORKERS` | `cpu_workers` | 0 is raised to 1 |
//! | `LANEWAY_STACK_SIZE` | `stack_size` | decimal (`65536`) or hex (`0x10000`) |
//! | `LANEWAY_REQUEST_TIMEOUT_MS` | `request_timeout_ms` | |
//!
//! ## Stack size
//!
//! Every IO lane invocation gets its own coroutine with this stack, so the
//! memory cost is `stack_size x concurrent IO requests`. Handlers with deep
//! call chains or large locals need more; `0x10000` (64 KB) is a safe start.
//!
//! ## Example
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 9000
//! cpu_workers: 4
//! stack_size: 0x8000
//! request_timeout_ms: 5000
//! ```

use crate::dispatcher::{default_cpu_workers, LaneConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_STACK_SIZE: usize = 0x10000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub host: String,
    pub port: u16,
    /// CPU lane pool size (default: available parallelism)
    pub cpu_workers: usize,
    /// IO lane coroutine stack size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: usize,
    /// Answer 504 when a handler runs longer than this
    pub request_timeout_ms: Option<u64>,
    /// Route manifest to serve instead of the built-in routes
    pub manifest: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cpu_workers: default_cpu_workers(),
            stack_size: DEFAULT_STACK_SIZE,
            request_timeout_ms: None,
            manifest: None,
        }
    }
}

/// Parse `65536` or `0x10000`.
#[must_use]
pub fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }
    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{s}'"))),
    }
}

impl RuntimeConfig {
    /// Defaults, then `path` (if any), then the environment.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not valid YAML for this schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env())
    }

    /// Defaults overlaid with the environment only.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| env::var(key).ok())
    }

    /// Overlay values from `lookup`. Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LANEWAY_HOST") {
            self.host = host;
        }
        if let Some(raw) = lookup("LANEWAY_PORT") {
            match raw.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %raw, "Ignoring invalid LANEWAY_PORT"),
            }
        }
        if let Some(raw) = lookup("LANEWAY_CPU_WORKERS") {
            match raw.trim().parse() {
                Ok(n) => self.cpu_workers = n,
                Err(_) => warn!(value = %raw, "Ignoring invalid LANEWAY_CPU_WORKERS"),
            }
        }
        if let Some(raw) = lookup("LANEWAY_STACK_SIZE") {
            match parse_size(&raw) {
                Some(n) => self.stack_size = n,
                None => warn!(value = %raw, "Ignoring invalid LANEWAY_STACK_SIZE"),
            }
        }
        if let Some(raw) = lookup("LANEWAY_REQUEST_TIMEOUT_MS") {
            match raw.trim().parse() {
                Ok(ms) => self.request_timeout_ms = Some(ms),
                Err(_) => warn!(value = %raw, "Ignoring invalid LANEWAY_REQUEST_TIMEOUT_MS"),
            }
        }
        self
    }

    /// Apply command-line flags; `None` leaves the current value.
    #[must_use]
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        cpu_workers: Option<usize>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(n) = cpu_workers {
            self.cpu_workers = n;
        }
        self
    }

    /// Raise a zero CPU worker count to 1.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.cpu_workers == 0 {
            warn!("cpu_workers = 0 is not usable, using 1");
            self.cpu_workers = 1;
        }
        self
    }

    #[must_use]
    pub fn lane_config(&self) -> LaneConfig {
        LaneConfig {
            cpu_workers: self.cpu_workers.max(1),
            io_stack_size: self.stack_size,
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
