//! Handler runners.
//!
//! A [`HandlerRunner`] turns a handler, the incoming request and the decoded
//! body into a [`Reply`]. Three runners exist:
//!
//! - [`PlainRunner`] passes the request and the body positionally.
//! - [`KwargsRunner`] binds arguments by name through a registry.
//! - [`EnvelopedRunner`] unwraps a request envelope, delegates to a
//!   [`KwargsRunner`] and wraps the result in a response envelope.

use std::sync::Arc;

use hermes_bind::{ArgumentRegistry, HandlerInvoker, InvalidHandlerArgument};
use hermes_core::{
    Bound, BoundArgs, BoxFuture, Handler, IncomingRequest, InputDataValidationError, Reply,
    RequestContext, RequestEnvelope,
};
use serde_json::Value;

use crate::enveloping::build_success;
use crate::error::DispatchError;

/// Runs a handler against one request.
pub trait HandlerRunner: Send + Sync + 'static {
    /// Returns the name of this runner, for logs.
    fn name(&self) -> &'static str;

    /// Binds the handler's arguments and runs it.
    ///
    /// Runners may record request state in `ctx`, such as the envelope id.
    fn run<'a>(
        &'a self,
        handler: &'a Handler,
        request: Arc<IncomingRequest>,
        body: Value,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Reply, DispatchError>>;
}

/// Passes the request and the body as the first and second argument.
///
/// A handler declaring more than two arguments cannot be served this way and
/// fails with [`InvalidHandlerArgument`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRunner;

impl PlainRunner {
    fn bind(
        handler: &Handler,
        request: Arc<IncomingRequest>,
        body: Value,
    ) -> Result<BoundArgs, InvalidHandlerArgument> {
        let mut args = BoundArgs::new();
        let mut positional = [Bound::Request(request), Bound::Value(body)].into_iter();

        for descriptor in handler.args() {
            let Some(value) = positional.next() else {
                return Err(InvalidHandlerArgument {
                    handler: handler.name().to_string(),
                    argument: descriptor.name().to_string(),
                    declared_type: descriptor.declared_type().to_string(),
                });
            };
            args.insert(descriptor.name(), value);
        }
        Ok(args)
    }
}

impl HandlerRunner for PlainRunner {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn run<'a>(
        &'a self,
        handler: &'a Handler,
        request: Arc<IncomingRequest>,
        body: Value,
        _ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Reply, DispatchError>> {
        Box::pin(async move {
            let args = Self::bind(handler, request, body)?;
            Ok(handler.call(args).await?)
        })
    }
}

/// Binds arguments by name through an [`ArgumentRegistry`].
#[derive(Debug, Clone)]
pub struct KwargsRunner {
    invoker: HandlerInvoker,
}

impl KwargsRunner {
    /// Creates a runner over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ArgumentRegistry>) -> Self {
        Self {
            invoker: HandlerInvoker::new(registry),
        }
    }

    /// Returns the invoker.
    #[must_use]
    pub const fn invoker(&self) -> &HandlerInvoker {
        &self.invoker
    }
}

impl HandlerRunner for KwargsRunner {
    fn name(&self) -> &'static str {
        "kwargs"
    }

    fn run<'a>(
        &'a self,
        handler: &'a Handler,
        request: Arc<IncomingRequest>,
        body: Value,
        _ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Reply, DispatchError>> {
        Box::pin(async move { Ok(self.invoker.invoke(handler, request, body).await?) })
    }
}

/// Reads a request envelope, runs the handler on its `data` and wraps the
/// result in a successful response envelope.
///
/// The envelope id is stored in the request context before the handler
/// runs, so failures after that point still echo it.
#[derive(Debug, Clone)]
pub struct EnvelopedRunner {
    inner: KwargsRunner,
}

impl EnvelopedRunner {
    /// Creates a runner over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<ArgumentRegistry>) -> Self {
        Self {
            inner: KwargsRunner::new(registry),
        }
    }
}

impl HandlerRunner for EnvelopedRunner {
    fn name(&self) -> &'static str {
        "enveloped"
    }

    fn run<'a>(
        &'a self,
        handler: &'a Handler,
        request: Arc<IncomingRequest>,
        body: Value,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Result<Reply, DispatchError>> {
        Box::pin(async move {
            let envelope = RequestEnvelope::from_value(body)
                .map_err(|e| InputDataValidationError::described("ValidationError", e))?;
            let id = envelope.id;
            ctx.set_envelope_id(id);

            let reply = self.inner.run(handler, request, envelope.data, ctx).await?;
            Ok(reply.try_map(move |result| serde_json::to_value(build_success(result, id))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo() -> Handler {
        Handler::plain("echo", |_request, body| async move { Ok(Reply::json(body)) })
    }

    fn request() -> Arc<IncomingRequest> {
        Arc::new(IncomingRequest::builder().build())
    }

    #[tokio::test]
    async fn test_plain_runner_echoes_body() {
        let mut ctx = RequestContext::default();
        let reply = PlainRunner
            .run(&echo(), request(), json!({"a": 1}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(reply.render().unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_plain_runner_rejects_third_argument() {
        let handler = Handler::builder("three")
            .request("request")
            .arg::<Value>("body")
            .arg::<String>("extra")
            .build(|_args: BoundArgs| async move { Ok(Reply::json(Value::Null)) });

        let mut ctx = RequestContext::default();
        let error = PlainRunner
            .run(&handler, request(), Value::Null, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(error, DispatchError::InvalidHandlerArgument(ref e) if e.argument == "extra"));
    }

    #[tokio::test]
    async fn test_enveloped_runner_wraps_result_and_records_id() {
        let runner = EnvelopedRunner::new(Arc::new(ArgumentRegistry::new().with_request_body("data")));
        let handler = Handler::builder("echo")
            .arg::<Value>("data")
            .build(|args: BoundArgs| async move { Ok(Reply::json(args.raw_value("data")?.clone())) });

        let mut ctx = RequestContext::default();
        let reply = runner
            .run(&handler, request(), json!({"data": [1, 2], "id": 5}), &mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.envelope_id(), Some(5));
        assert_eq!(
            reply.render().unwrap(),
            json!({"success": true, "result": [1, 2], "id": 5})
        );
    }

    #[tokio::test]
    async fn test_enveloped_runner_rejects_bad_envelope() {
        let runner = EnvelopedRunner::new(Arc::new(ArgumentRegistry::new()));
        let mut ctx = RequestContext::default();
        let error = runner
            .run(&echo(), request(), json!({"data": 1, "extra": true}), &mut ctx)
            .await
            .unwrap_err();

        assert_eq!(error.status_code(), http::StatusCode::BAD_REQUEST);
        assert!(error.to_string().starts_with("ValidationError - unknown field `extra`"));
        assert_eq!(ctx.envelope_id(), None);
    }
}
