//! The middleware dispatcher.
//!
//! Every request routed to a [`Handler`] goes through the same fixed
//! sequence of stages:
//!
//! ```text
//! Received → BodyParsed → HandlerRun → BodySerialized → Responded
//! ```
//!
//! A body that is not JSON skips straight to serialization with a 400
//! error. Serialization never fails outward: if the reply cannot be encoded,
//! the error body for that failure is encoded instead and the status is
//! forced to 500.
//!
//! Targets that are not handlers ([`Target::Passthrough`]) bypass the stages
//! and receive the request unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use hermes_bind::ArgumentRegistry;
use hermes_core::{json, BoxFuture, Handler, IncomingRequest, Reply, RequestContext, SerializationError};
use http::StatusCode;

use crate::enveloping::{EnvelopedErrorBody, ErrorBodyBuilder, PlainErrorBody};
use crate::error::DispatchError;
use crate::runner::{EnvelopedRunner, HandlerRunner, KwargsRunner, PlainRunner};
use crate::types::{Response, ResponseExt};

/// Written when even the error body cannot be encoded.
const FALLBACK_BODY: &str =
    r#"{"error_type":"SerializationFailure","error_message":"response body could not be encoded"}"#;

/// Dispatcher stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// The request has been routed to a handler.
    Received,
    /// The body has been decoded.
    BodyParsed,
    /// The handler has finished, successfully or not.
    HandlerRun,
    /// The response body has been encoded.
    BodySerialized,
    /// The response has been built.
    Responded,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::BodyParsed => "body_parsed",
            Self::HandlerRun => "handler_run",
            Self::BodySerialized => "body_serialized",
            Self::Responded => "responded",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function serving a request outside the dispatcher stages.
pub type Passthrough = Arc<dyn Fn(IncomingRequest) -> BoxFuture<'static, Response> + Send + Sync>;

/// What a route points at.
#[derive(Clone)]
pub enum Target {
    /// A handler served through the dispatcher stages.
    Handler(Arc<Handler>),
    /// An endpoint that receives the request unmodified.
    Passthrough(Passthrough),
}

impl Target {
    /// Creates a handler target.
    #[must_use]
    pub fn handler(handler: Handler) -> Self {
        Self::Handler(Arc::new(handler))
    }

    /// Creates a passthrough target from an async function.
    pub fn passthrough<F, Fut>(f: F) -> Self
    where
        F: Fn(IncomingRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self::Passthrough(Arc::new(move |request| Box::pin(f(request))))
    }

    /// Returns `true` for handler targets.
    #[must_use]
    pub const fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(handler) => f.debug_tuple("Handler").field(&handler.name()).finish(),
            Self::Passthrough(_) => f.write_str("Passthrough"),
        }
    }
}

impl From<Handler> for Target {
    fn from(handler: Handler) -> Self {
        Self::handler(handler)
    }
}

/// Runs handlers and turns their outcome into JSON responses.
///
/// A dispatcher is a [`HandlerRunner`] composed with an
/// [`ErrorBodyBuilder`]. It holds no per-request state and is cheap to
/// clone.
///
/// # Example
///
/// ```rust
/// use hermes_core::{IncomingRequest, Handler, Reply};
/// use hermes_middleware::{Dispatcher, Target};
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let dispatcher = Dispatcher::plain();
/// let echo = Target::handler(Handler::plain("echo", |_request, body| async move {
///     Ok(Reply::json(body))
/// }));
///
/// let request = IncomingRequest::builder().body(r#"{"any":"json"}"#).build();
/// let response = dispatcher.dispatch(&echo, request).await;
/// assert_eq!(response.status(), StatusCode::OK);
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    runner: Arc<dyn HandlerRunner>,
    errors: Arc<dyn ErrorBodyBuilder>,
}

impl Dispatcher {
    /// Composes a dispatcher from a runner and an error body builder.
    pub fn new(runner: impl HandlerRunner, errors: impl ErrorBodyBuilder) -> Self {
        Self {
            runner: Arc::new(runner),
            errors: Arc::new(errors),
        }
    }

    /// Positional request and body arguments, bare results and error bodies.
    #[must_use]
    pub fn plain() -> Self {
        Self::new(PlainRunner, PlainErrorBody)
    }

    /// Arguments bound by name, bare results and error bodies.
    #[must_use]
    pub fn kwargs(registry: Arc<ArgumentRegistry>) -> Self {
        Self::new(KwargsRunner::new(registry), PlainErrorBody)
    }

    /// Arguments bound by name from a request envelope, with results and
    /// errors wrapped in response envelopes.
    #[must_use]
    pub fn enveloped(registry: Arc<ArgumentRegistry>) -> Self {
        Self::new(EnvelopedRunner::new(registry), EnvelopedErrorBody)
    }

    /// Serves one request.
    pub async fn dispatch(&self, target: &Target, request: IncomingRequest) -> Response {
        match target {
            Target::Handler(handler) => self.dispatch_handler(handler, request).await,
            Target::Passthrough(passthrough) => {
                tracing::trace!(
                    request_id = %request.request_id(),
                    path = request.path(),
                    "dispatcher bypassed"
                );
                passthrough(request).await
            }
        }
    }

    async fn dispatch_handler(&self, handler: &Handler, request: IncomingRequest) -> Response {
        let mut ctx = RequestContext::new(request.request_id()).with_handler(handler.name());
        trace_stage(&ctx, Stage::Received);

        let parsed = json::from_slice(request.body());
        let outcome = match parsed {
            Ok(body) => {
                trace_stage(&ctx, Stage::BodyParsed);
                let outcome = self
                    .runner
                    .run(handler, Arc::new(request), body, &mut ctx)
                    .await;
                trace_stage(&ctx, Stage::HandlerRun);
                outcome
            }
            Err(e) => Err(DispatchError::MalformedBody(e)),
        };

        let (status, body) = self.serialize(outcome, &ctx);
        trace_stage(&ctx, Stage::BodySerialized);

        let response = Response::json(status, body);
        trace_stage(&ctx, Stage::Responded);
        tracing::debug!(
            request_id = %ctx.request_id(),
            handler = handler.name(),
            status = status.as_u16(),
            elapsed_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request dispatched"
        );
        response
    }

    fn serialize(
        &self,
        outcome: Result<Reply, DispatchError>,
        ctx: &RequestContext,
    ) -> (StatusCode, Bytes) {
        let (status, reply) = match outcome {
            Ok(reply) => (StatusCode::OK, reply),
            Err(error) => {
                log_failure(&error, ctx);
                (error.status_code(), self.errors.error_body(&error, ctx))
            }
        };

        match encode(reply) {
            Ok(body) => (status, body),
            Err(error) => {
                let error = DispatchError::Serialization(error);
                log_failure(&error, ctx);
                let body = encode(self.errors.error_body(&error, ctx))
                    .unwrap_or_else(|_| Bytes::from_static(FALLBACK_BODY.as_bytes()));
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        }
    }

    /// Returns the runner name.
    #[must_use]
    pub fn runner_name(&self) -> &'static str {
        self.runner.name()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("runner", &self.runner.name())
            .field("errors", &self.errors.name())
            .finish()
    }
}

fn encode(reply: Reply) -> Result<Bytes, SerializationError> {
    let value = reply.render()?;
    json::to_string(&value)
        .map(Bytes::from)
        .map_err(|e| SerializationError::new("serde_json::Value", e))
}

fn trace_stage(ctx: &RequestContext, stage: Stage) {
    tracing::debug!(request_id = %ctx.request_id(), stage = %stage, "dispatch stage");
}

fn log_failure(error: &DispatchError, ctx: &RequestContext) {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(
            request_id = %ctx.request_id(),
            handler = ctx.handler().unwrap_or_default(),
            status = status.as_u16(),
            error_type = error.error_type(),
            error = %error,
            "handler failed"
        );
    } else {
        tracing::warn!(
            request_id = %ctx.request_id(),
            handler = ctx.handler().unwrap_or_default(),
            status = status.as_u16(),
            error_type = error.error_type(),
            error = %error,
            "request rejected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn echo() -> Target {
        Target::handler(Handler::plain("echo", |_request, body| async move {
            Ok(Reply::json(body))
        }))
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Received < Stage::BodyParsed);
        assert!(Stage::BodySerialized < Stage::Responded);
        assert_eq!(Stage::HandlerRun.to_string(), "handler_run");
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let response = Dispatcher::plain()
            .dispatch(&echo(), IncomingRequest::builder().build())
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error_type"], "MalformedBody");
    }

    #[tokio::test]
    async fn test_passthrough_bypasses_stages() {
        let target = Target::passthrough(|request: IncomingRequest| async move {
            Response::json(StatusCode::ACCEPTED, format!("\"{}\"", request.path()))
        });
        let request = IncomingRequest::builder().uri("/health").body("not json").build();

        let response = Dispatcher::plain().dispatch(&target, request).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await, json!("/health"));
    }

    #[test]
    fn test_serialize_falls_back_to_error_body() {
        struct Unencodable;

        impl serde::Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("no JSON form"))
            }
        }

        let dispatcher = Dispatcher::plain();
        let (status, body) = dispatcher.serialize(Ok(Reply::new(Unencodable)), &RequestContext::default());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error_type"], "SerializationFailure");
        assert!(value["error_message"]
            .as_str()
            .unwrap()
            .contains("is not JSON serializable"));
    }

    #[test]
    fn test_fallback_body_is_valid_json() {
        let value: Value = serde_json::from_str(FALLBACK_BODY).unwrap();
        assert_eq!(value["error_type"], "SerializationFailure");
    }

    #[test]
    fn test_debug_names_capabilities() {
        let debug = format!("{:?}", Dispatcher::enveloped(Arc::default()));
        assert!(debug.contains("enveloped"));
    }
}
