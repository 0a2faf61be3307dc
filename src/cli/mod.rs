//! # CLI Module
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! laneway serve --port 8080 --cpu-workers 4
//! laneway serve --config laneway.yaml --manifest routes.yaml
//! ```
//!
//! Starts the HTTP listener with the demo handlers and stops on SIGINT or
//! SIGTERM. Without `--manifest` the built-in demo routes are served.
//!
//! ### `routes`
//!
//! ```bash
//! laneway routes --manifest routes.yaml
//! ```
//!
//! Resolves the manifest and prints the route table in registration order.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{resolve_routes, run_cli, start_server, Cli, Commands, RouteSource};
