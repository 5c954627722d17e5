//! HTTP server implementation.
//!
//! The [`Server`] accepts HTTP/1.1 connections, reads each request body with
//! a timeout, routes the request and hands it to the [`Dispatcher`].
//!
//! # Example
//!
//! ```rust,no_run
//! use hermes_core::{Handler, Reply};
//! use hermes_middleware::Dispatcher;
//! use hermes_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let echo = Handler::plain("echo", |_request, body| async move { Ok(Reply::json(body)) });
//!
//!     let server = Server::builder()
//!         .http_addr("0.0.0.0:5000")
//!         .dispatcher(Dispatcher::plain())
//!         .post("/echo", echo)
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use hermes_core::{AppState, IncomingRequest};
use hermes_middleware::{Dispatcher, Response, ResponseExt, Target};
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::router::{RouteResult, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Path of the built-in liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address we tried to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The HTTP server.
///
/// Holds the router, the dispatcher and the application state shared by
/// every request.
pub struct Server {
    config: ServerConfig,
    router: Router,
    dispatcher: Dispatcher,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serves one request whose body is already in memory.
    ///
    /// This is the whole request path minus the socket: routing, the 404
    /// and 405 answers, and dispatch.
    pub async fn handle(&self, request: Request<Bytes>) -> Response {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();
        tracing::debug!(method = %parts.method, path = %path, "request");

        match self.router.match_route(&parts.method, &path) {
            RouteResult::Matched(route) => {
                let (target, params) = route.into_parts();
                let request = IncomingRequest::builder()
                    .method(parts.method)
                    .parsed_uri(parts.uri)
                    .headers(parts.headers)
                    .body(body)
                    .path_params(params)
                    .state(Arc::clone(&self.state))
                    .build();
                self.dispatcher.dispatch(&target, request).await
            }
            RouteResult::MethodNotAllowed { allowed } => {
                let message = format!("method {} is not allowed for {path}", parts.method);
                let mut response =
                    Response::json_error(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", &message);
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
            RouteResult::NotFound => Response::json_error(
                StatusCode::NOT_FOUND,
                "NotFound",
                &format!("no route for {path}"),
            ),
        }
    }

    /// Runs the server until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for open connections.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, routes = self.router.route_count(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(remote = %remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "waiting for open connections"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);

        tokio::select! {
            result = conn => result,
            () = shutdown.recv() => {
                tracing::debug!(remote = %remote_addr, "connection closed by shutdown");
                Ok(())
            }
        }
    }

    async fn handle_request(&self, request: Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();

        let body = match tokio::time::timeout(self.config.body_timeout(), body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read request body");
                return Response::json_error(
                    StatusCode::BAD_REQUEST,
                    "BodyReadError",
                    &format!("failed to read request body: {e}"),
                );
            }
            Err(_) => {
                tracing::warn!("request body read timed out");
                return Response::json_error(
                    StatusCode::REQUEST_TIMEOUT,
                    "RequestTimeout",
                    "request body read timed out",
                );
            }
        };

        self.handle(Request::from_parts(parts, body)).await
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.router.route_count())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

async fn health(_request: IncomingRequest) -> Response {
    let body = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    });
    Response::json_value(StatusCode::OK, &body)
}

/// Builder for [`Server`].
///
/// ```rust
/// use hermes_core::{Handler, Reply};
/// use hermes_server::Server;
/// use std::time::Duration;
///
/// let server = Server::builder()
///     .http_addr("127.0.0.1:0")
///     .shutdown_timeout(Duration::from_secs(5))
///     .post("/echo", Handler::plain("echo", |_r, body| async move { Ok(Reply::json(body)) }))
///     .build();
///
/// // the echo route plus the built-in health check
/// assert_eq!(server.router().route_count(), 2);
/// ```
pub struct ServerBuilder {
    config: ServerConfigBuilder,
    dispatcher: Option<Dispatcher>,
    state: AppState,
    routes: Vec<(Method, String, Target)>,
    health: bool,
}

impl ServerBuilder {
    /// Creates a builder with default configuration, the plain dispatcher,
    /// empty state and the health endpoint enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfigBuilder::new(),
            dispatcher: None,
            state: AppState::new(),
            routes: Vec::new(),
            health: true,
        }
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config = self.config.http_addr(addr);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.shutdown_timeout(timeout);
        self
    }

    /// Sets the request body timeout.
    #[must_use]
    pub fn body_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.body_timeout(timeout);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.config = ServerConfigBuilder::new()
            .http_addr(config.http_addr())
            .shutdown_timeout(config.shutdown_timeout())
            .body_timeout(config.body_timeout());
        self
    }

    /// Sets the dispatcher.
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Sets the application state.
    #[must_use]
    pub fn state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn route(mut self, method: Method, pattern: impl Into<String>, target: impl Into<Target>) -> Self {
        self.routes.push((method, pattern.into(), target.into()));
        self
    }

    /// Adds a `GET` route.
    #[must_use]
    pub fn get(self, pattern: impl Into<String>, target: impl Into<Target>) -> Self {
        self.route(Method::GET, pattern, target)
    }

    /// Adds a `POST` route.
    #[must_use]
    pub fn post(self, pattern: impl Into<String>, target: impl Into<Target>) -> Self {
        self.route(Method::POST, pattern, target)
    }

    /// Leaves out the built-in `GET /health` endpoint.
    #[must_use]
    pub fn without_health(mut self) -> Self {
        self.health = false;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let mut router = Router::new();
        if self.health {
            router.add_route(Method::GET, HEALTH_PATH, Target::passthrough(health));
        }
        for (method, pattern, target) in self.routes {
            router.add_route(method, pattern, target);
        }

        Server {
            config: self.config.build(),
            router,
            dispatcher: self.dispatcher.unwrap_or_else(Dispatcher::plain),
            state: Arc::new(self.state),
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
