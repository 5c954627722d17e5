//! Assembles the persons service for each dispatch mode.

use std::sync::Arc;

use hermes_bind::ArgumentRegistry;
use hermes_config::{DispatchMode, ServiceConfig};
use hermes_core::AppState;
use hermes_middleware::Dispatcher;
use hermes_server::{Server, ServerBuilder};

use crate::persons::{create_handler, info_handler, read_handler, MemoryStorage};
use crate::simple::{handler500, some_handler};

/// Application state key of the person storage.
pub const STORAGE_KEY: &str = "storage";

/// Argument names the persons handlers are bound by.
///
/// `data` is the request body, `storage` the application state entry of
/// the same name and `info_id` the path parameter of the same name.
#[must_use]
pub fn registry() -> ArgumentRegistry {
    ArgumentRegistry::new()
        .with_request_body("data")
        .with_app_key(STORAGE_KEY)
        .with_path_param("info_id")
}

/// Builds the server described by `config`.
#[must_use]
pub fn build_server(config: &ServiceConfig) -> Server {
    let builder = Server::builder()
        .http_addr(config.http_addr())
        .shutdown_timeout(config.shutdown_timeout())
        .body_timeout(config.body_timeout());
    routes(builder, config.service.mode).build()
}

/// Builds a server for `mode` with default transport settings.
#[must_use]
pub fn server_for(mode: DispatchMode) -> Server {
    routes(Server::builder(), mode).build()
}

fn routes(builder: ServerBuilder, mode: DispatchMode) -> ServerBuilder {
    tracing::info!(mode = %mode, "assembling persons service");
    match mode {
        DispatchMode::Simple => builder
            .dispatcher(Dispatcher::plain())
            .post("/some_handler", some_handler())
            .post("/handler500", handler500()),
        DispatchMode::Kwargs => persons(builder.dispatcher(Dispatcher::kwargs(Arc::new(registry())))),
        DispatchMode::Wraps => persons(builder.dispatcher(Dispatcher::enveloped(Arc::new(registry())))),
    }
}

fn persons(builder: ServerBuilder) -> ServerBuilder {
    let state = AppState::new().with(STORAGE_KEY, Arc::new(MemoryStorage::new()));
    builder
        .state(state)
        .post("/create", create_handler())
        .get("/info/{info_id}", info_handler())
        .post("/read", read_handler())
}
