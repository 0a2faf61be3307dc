//! # Binder Module
//!
//! Turns a route's declared [`ParameterSpec`](crate::route::ParameterSpec)s
//! and a [`RequestContext`](crate::server::RequestContext) into the concrete,
//! type-coerced [`Args`] a handler is invoked with.
//!
//! Binding runs synchronously on the request's own coroutine, before
//! dispatch. It never blocks and only allocates for the argument values.
//!
//! ## Missing values
//!
//! | Source | Missing and required | Missing and optional |
//! |---|---|---|
//! | path / query / header | [`BindingError`](crate::error::BindingError) | `None` |
//! | body | `None` | `None` |
//!
//! Body parameters are deliberately lenient: a handler that truly needs the
//! body must check its argument itself.

mod args;
mod core;

pub use args::{ArgValue, Args};
pub use core::Binder;
