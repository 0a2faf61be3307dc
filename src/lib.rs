//! # laneway
//!
//! **laneway** is a declarative-route HTTP dispatch core built on the `may`
//! coroutine runtime. Routes are declared up front (in code or a YAML
//! manifest), each bound to a handler, its parameters and a workload class
//! that decides which execution lane runs it.
//!
//! ## Architecture
//!
//! - **[`route`]** - Route descriptors, parameter specs, YAML manifests
//! - **[`router`]** - Route table and `{name}` path pattern matching
//! - **[`binder`]** - Parameter binding and type coercion
//! - **[`codec`]** - Injectable body codec (JSON by default)
//! - **[`dispatcher`]** - Handlers, memoized controllers, IO and CPU lanes
//! - **[`server`]** - Request context, pipeline, response assembly, `may_minihttp` adapter
//! - **[`runtime_config`]** / **[`logging`]** - Layered configuration and `tracing` setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may_minihttp)
//!     participant Table as RouteTable
//!     participant Binder as Binder
//!     participant Dispatcher as Dispatcher
//!     participant Lane as IO / CPU lane
//!     participant Assembler as ResponseAssembler
//!
//!     Client->>Server: GET /users/42
//!     Server->>Server: parse_request -> RequestContext
//!     Server->>Table: lookup(GET, /users/42)
//!     alt no route
//!         Table-->>Assembler: Failure 404
//!     else matched /users/{id}
//!         Table-->>Server: RouteMatch {id: "42"}
//!         Server->>Binder: bind(parameters, ctx)
//!         alt required parameter missing
//!             Binder-->>Assembler: Failure 400
//!         else bound
//!             Binder-->>Server: Args
//!             Server->>Dispatcher: dispatch(handler, args, workload)
//!             Dispatcher->>Lane: submit task
//!             Dispatcher-->>Server: OutcomeFuture
//!             Lane->>Lane: handler (catch_unwind)
//!             Lane-->>Server: Outcome
//!         end
//!     end
//!     Server->>Assembler: assemble(outcome)
//!     Assembler-->>Client: status + Content-Type + body
//! ```
//!
//! ## Lanes
//!
//! - **IO lane**: one coroutine per invocation. Unbounded; it scales with
//!   request volume rather than core count.
//! - **CPU lane**: a fixed pool of OS threads, one per available core by
//!   default. Compute-heavy handlers queue here instead of starving the
//!   coroutine scheduler.
//!
//! The lane is a static property of the route. Callers always get an
//! [`OutcomeFuture`](dispatcher::OutcomeFuture) and never need to know which
//! lane ran the handler.
//!
//! ## Quick Start
//!
//! ```no_run
//! use laneway::dispatcher::{handler_fn, Dispatcher, LaneConfig};
//! use laneway::route::{ParameterSpec, RouteDescriptor};
//! use laneway::router::RouteTable;
//! use laneway::server::{AppService, DispatchService, HttpServer};
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let table = RouteTable::new();
//! table.register(
//!     RouteDescriptor::new(
//!         Method::GET,
//!         "/users/{id}",
//!         handler_fn(|args| Ok(json!({ "id": args.str(0) }))),
//!     )
//!     .param(ParameterSpec::path("id")),
//! )?;
//!
//! let dispatcher = Arc::new(Dispatcher::new(LaneConfig::default())?);
//! let service = AppService::new(DispatchService::with_json(Arc::new(table), dispatcher));
//! let handle = HttpServer(service).start("127.0.0.1:8080")?;
//! handle.join().ok();
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtime Considerations
//!
//! laneway uses the `may` coroutine runtime, not tokio. IO lane handlers run
//! in coroutines and should block through `may`'s facilities. The coroutine
//! stack size is set with `LANEWAY_STACK_SIZE` (see [`runtime_config`]).
//! The crate must be built with `panic = "unwind"`: handler panics are
//! caught at the lane boundary and become 500 responses.

pub mod binder;
pub mod cli;
pub mod codec;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod registry;
pub mod route;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use binder::{ArgValue, Args, Binder};
pub use codec::{Codec, JsonCodec};
pub use dispatcher::{handler_fn, Controller, Dispatcher, Failure, HandlerRef, Outcome, OutcomeFuture};
pub use error::{BindingError, CodecError, DispatchError, ManifestError, RouteError};
pub use registry::HandlerRegistry;
pub use route::{ParameterSpec, RouteDescriptor, Shape, SourceKind, WorkloadClass};
pub use router::{matches, RouteTable};
pub use server::{DispatchService, RequestContext, ResponseAssembler};
