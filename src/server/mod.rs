//! # Server Module
//!
//! The transport boundary and the per-request pipeline.
//!
//! - [`RequestContext`]: the decoded request handed to the core
//! - [`DispatchService`]: resolve, bind, dispatch, then assemble
//! - [`ResponseAssembler`]: outcome to status, headers and body
//! - [`AppService`] / [`HttpServer`]: a thin `may_minihttp` adapter

pub mod http_server;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use pipeline::{DispatchService, PendingResponse, Phase, RequestStats};
pub use request::{parse_query_string, parse_request, RequestContext};
pub use response::{status_reason, HeaderVec, HttpReply, ResponseAssembler};
pub use service::{write_reply, AppService};
