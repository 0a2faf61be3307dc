//! # Router Module
//!
//! Route table and path matching.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Holding the `(verb, path pattern)` -> [`RouteDescriptor`](crate::route::RouteDescriptor) table
//! - Resolving an incoming request to a route
//! - Extracting path parameters from `{name}` placeholders
//!
//! ## Architecture
//!
//! Resolution is two-phase:
//!
//! 1. **Exact**: the request path is looked up as a literal key for its verb.
//! 2. **Pattern**: on a miss, the verb's placeholder patterns are tried in
//!    registration order with a segment-by-segment [`PathPattern`] match.
//!
//! The table is read-mostly. It is published as an immutable snapshot so
//! lookups never wait on registration.
//!
//! ## Example
//!
//! ```rust,ignore
//! use laneway::router::RouteTable;
//!
//! let table = RouteTable::new();
//! table.register(RouteDescriptor::new(Method::GET, "/users/{id}", handler))?;
//!
//! if let Some(m) = table.lookup(&Method::GET, "/users/123") {
//!     assert_eq!(m.get_path_param("id"), Some("123"));
//! }
//! ```

mod core;
mod matcher;

pub use core::{RouteMatch, RouteTable};
pub use matcher::{matches, ParamVec, PathPattern, MAX_INLINE_PARAMS};
