//! # Hermes Server
//!
//! HTTP server for Hermes services.
//!
//! This crate provides:
//!
//! - [`Server`] and [`ServerBuilder`] - the hyper HTTP/1.1 server
//! - [`Router`] - method and `{param}` path matching
//! - [`ShutdownSignal`] and [`ConnectionTracker`] - graceful shutdown
//! - A built-in `GET /health` endpoint that bypasses the dispatcher
//!
//! Requests that match a route are handed to a
//! [`hermes_middleware::Dispatcher`]. Unknown paths get a 404 JSON body and
//! known paths with the wrong method get a 405 with an `Allow` header.

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod router;
mod server;
pub mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_BODY_TIMEOUT_SECS, DEFAULT_HTTP_ADDR,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use router::{RouteMatch, RouteResult, Router};
pub use server::{Server, ServerBuilder, ServerError, HEALTH_PATH};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
