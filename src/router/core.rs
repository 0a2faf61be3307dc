//! Route table core - hot path for request resolution.
//!
//! Reads go through an [`ArcSwap`] snapshot and never take a lock.
//! Registration copies the current snapshot, applies the change and swaps it
//! in, so a lookup racing a registration sees either the old or the new table,
//! never a partial one.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use super::matcher::{ParamVec, PathPattern};
use crate::dispatcher::HandlerRef;
use crate::error::RouteError;
use crate::route::{ParameterSpec, RouteDescriptor, WorkloadClass};
use arc_swap::ArcSwap;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of resolving a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched descriptor
    pub route: Arc<RouteDescriptor>,
    /// Placeholder bindings (`{id}` -> `"123"`), empty for literal routes
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when a pattern repeats a name
    /// (`/org/{id}/user/{id}` returns the user id).
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a map. Allocates.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[derive(Debug)]
struct CompiledRoute {
    descriptor: Arc<RouteDescriptor>,
    pattern: PathPattern,
}

#[derive(Debug, Clone, Default)]
struct RouteSnapshot {
    /// verb -> literal path -> route (O(1) exact lookup); literal patterns only
    exact: HashMap<Method, HashMap<String, Arc<CompiledRoute>>>,
    /// verb -> placeholder patterns in registration order
    patterns: HashMap<Method, Vec<Arc<CompiledRoute>>>,
    /// every route in registration order
    ordered: Vec<Arc<CompiledRoute>>,
}

impl RouteSnapshot {
    /// Insert or replace. A replacement keeps the original registration slot.
    fn upsert(&mut self, route: Arc<CompiledRoute>) -> bool {
        let method = route.descriptor.method.clone();
        let key = route.pattern.as_str().to_string();

        if route.pattern.has_params() {
            let list = self.patterns.entry(method.clone()).or_default();
            match list.iter().position(|r| r.pattern.as_str() == key) {
                Some(idx) => list[idx] = Arc::clone(&route),
                None => list.push(Arc::clone(&route)),
            }
        } else {
            self.exact
                .entry(method.clone())
                .or_default()
                .insert(key.clone(), Arc::clone(&route));
        }

        match self
            .ordered
            .iter()
            .position(|r| r.descriptor.method == method && r.pattern.as_str() == key)
        {
            Some(idx) => {
                self.ordered[idx] = route;
                true
            }
            None => {
                self.ordered.push(route);
                false
            }
        }
    }
}

/// Route table keyed by `(verb, path pattern)`.
///
/// # Duplicate registrations
///
/// Registering the same `(verb, pattern)` twice replaces the first
/// descriptor: **last write wins**. The replacement keeps the original
/// registration position, so pattern tie-breaking stays stable.
///
/// # Lookup order
///
/// 1. Exact key match on `(verb, path)`, one hash lookup, independent of how
///    many pattern routes exist.
/// 2. Otherwise every placeholder pattern for that verb, in registration
///    order; the first pattern that matches wins. Two patterns that both
///    match a path (`/users/{id}` and `/{kind}/{id}`) are resolved
///    deterministically by whichever was registered first.
///
/// Verb and path are always matched jointly.
pub struct RouteTable {
    snapshot: ArcSwap<RouteSnapshot>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RouteSnapshot::default()),
        }
    }

    /// Build a table from startup descriptors, registering in order.
    pub fn from_descriptors(descriptors: Vec<RouteDescriptor>) -> Result<Self, RouteError> {
        let table = Self::new();
        let mut next = RouteSnapshot::default();
        for descriptor in descriptors {
            let pattern = PathPattern::parse(&descriptor.path_pattern)?;
            if next.upsert(Arc::new(CompiledRoute {
                descriptor: Arc::new(descriptor),
                pattern,
            })) {
                warn!("Duplicate route in startup descriptors - last registration wins");
            }
        }

        let routes_summary: Vec<String> = next
            .ordered
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.descriptor.method, r.pattern.as_str()))
            .collect();
        info!(
            routes_count = next.ordered.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        table.snapshot.store(Arc::new(next));
        Ok(table)
    }

    /// Insert or replace the route for `(descriptor.method, descriptor.path_pattern)`.
    ///
    /// Safe to call while other threads are looking routes up.
    pub fn register(&self, descriptor: RouteDescriptor) -> Result<(), RouteError> {
        let pattern = PathPattern::parse(&descriptor.path_pattern)?;
        let route = Arc::new(CompiledRoute {
            descriptor: Arc::new(descriptor),
            pattern,
        });

        let mut replaced = false;
        self.snapshot.rcu(|current| {
            let mut next = RouteSnapshot::clone(current);
            replaced = next.upsert(Arc::clone(&route));
            next
        });

        if replaced {
            warn!(
                method = %route.descriptor.method,
                path_pattern = %route.pattern.as_str(),
                handler_name = %route.descriptor.handler_name,
                "Replaced existing route - last registration wins"
            );
        } else {
            info!(
                method = %route.descriptor.method,
                path_pattern = %route.pattern.as_str(),
                handler_name = %route.descriptor.handler_name,
                workload = %route.descriptor.workload,
                "Route registered"
            );
        }
        Ok(())
    }

    /// Registration in argument form.
    pub fn add(
        &self,
        method: Method,
        path_pattern: &str,
        handler: HandlerRef,
        parameters: Vec<ParameterSpec>,
        workload: WorkloadClass,
    ) -> Result<(), RouteError> {
        self.register(
            RouteDescriptor::new(method, path_pattern, handler)
                .params(parameters)
                .workload(workload),
        )
    }

    /// Resolve a request to a route.
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - exact or pattern match, with path parameters bound
    /// * `None` - no route for this verb and path (404)
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let match_start = Instant::now();
        let snapshot = self.snapshot.load();

        let exact = snapshot
            .exact
            .get(method)
            .and_then(|by_path| by_path.get(path));

        let found = match exact {
            Some(route) => Some(RouteMatch {
                route: Arc::clone(&route.descriptor),
                path_params: ParamVec::new(),
            }),
            None => snapshot.patterns.get(method).and_then(|candidates| {
                candidates.iter().find_map(|route| {
                    route.pattern.match_path(path).map(|path_params| RouteMatch {
                        route: Arc::clone(&route.descriptor),
                        path_params,
                    })
                })
            }),
        };

        let match_duration = match_start.elapsed();
        match &found {
            Some(m) if match_duration > Duration::from_millis(1) => warn!(
                method = %method,
                path = %path,
                handler_name = %m.route.handler_name,
                route_pattern = %m.route.path_pattern,
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            ),
            Some(m) => debug!(
                method = %method,
                path = %path,
                handler_name = %m.route.handler_name,
                route_pattern = %m.route.path_pattern,
                path_params = ?m.path_params,
                exact = exact.is_some(),
                "Route matched"
            ),
            None => debug!(
                method = %method,
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            ),
        }
        found
    }

    /// All descriptors in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<RouteDescriptor>> {
        self.snapshot
            .load()
            .ordered
            .iter()
            .map(|r| Arc::clone(&r.descriptor))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        println!("[routes] count={}", routes.len());
        for route in routes {
            println!(
                "[route] {} {} -> {} ({} lane, {} params)",
                route.method,
                route.path_pattern,
                route.handler_name,
                route.workload,
                route.parameters.len()
            );
        }
    }
}
