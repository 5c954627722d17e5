//! # Hermes Core
//!
//! Core types for the Hermes argument-binding middleware.
//!
//! - [`Handler`] - An async function with an explicit list of [`ArgDescriptor`]s
//! - [`BoundArgs`] - The arguments resolved for one call
//! - [`IncomingRequest`] - The routed request with its body read
//! - [`AppState`] - Named shared resources such as storage
//! - [`HandlerError`] - Two-tier handler errors (validation or domain)
//! - [`Reply`] - A handler result whose JSON encoding is deferred
//! - [`RequestEnvelope`] / [`ResponseEnvelope`] - The `{data, id}` and
//!   `{success, result, id}` wire wrappers

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod envelope;
mod error;
mod handler;
pub mod json;
mod reply;
mod request;
mod state;

pub use context::{RequestContext, RequestId};
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use error::{
    ErrorBody, ErrorTier, HandlerError, HandlerResult, InputDataValidationError,
    SerializationError,
};
pub use handler::{
    ArgDescriptor, ArgKind, ArgumentError, BoxFuture, Bound, BoundArgs, Handler, HandlerBuilder,
};
pub use reply::Reply;
pub use request::{IncomingRequest, IncomingRequestBuilder};
pub use state::{AppState, SharedValue, StateError};
