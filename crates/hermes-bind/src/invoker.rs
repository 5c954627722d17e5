//! Handler invocation by argument name.

use std::sync::Arc;

use hermes_core::{Bound, BoundArgs, Handler, HandlerError, IncomingRequest, Reply};
use serde_json::Value;
use thiserror::Error;

use crate::error::{ExtractionError, InvalidHandlerArgument};
use crate::registry::{ArgumentRegistry, ArgumentSource};

/// Failure of [`HandlerInvoker::invoke`].
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The handler declares an argument without a strategy.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidHandlerArgument),

    /// A strategy failed while extracting an argument.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The handler ran and returned an error.
    #[error("{0}")]
    Handler(HandlerError),
}

impl From<HandlerError> for InvokeError {
    fn from(error: HandlerError) -> Self {
        Self::Handler(error)
    }
}

/// Binds handler arguments through a registry and calls the handler.
///
/// Every argument is resolved before the handler is called. If any of them
/// cannot be resolved the handler never runs.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use hermes_bind::{ArgumentRegistry, HandlerInvoker};
/// use hermes_core::{BoundArgs, Handler, IncomingRequest, Reply};
/// use serde_json::{json, Value};
///
/// # tokio_test::block_on(async {
/// let invoker = HandlerInvoker::new(Arc::new(ArgumentRegistry::new().with_request_body("data")));
///
/// let echo = Handler::builder("echo")
///     .arg::<Value>("data")
///     .build(|args: BoundArgs| async move { Ok(Reply::json(args.raw_value("data")?.clone())) });
///
/// let request = Arc::new(IncomingRequest::builder().build());
/// let reply = invoker.invoke(&echo, request, json!({"a": 1})).await.unwrap();
/// assert_eq!(reply.render().unwrap(), json!({"a": 1}));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct HandlerInvoker {
    registry: Arc<ArgumentRegistry>,
}

impl HandlerInvoker {
    /// Creates an invoker over a registry.
    #[must_use]
    pub const fn new(registry: Arc<ArgumentRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ArgumentRegistry> {
        &self.registry
    }

    /// Resolves every declared argument of `handler`.
    ///
    /// Request arguments receive `request` whatever their name, even if the
    /// registry has a strategy for that name. Other arguments are looked up
    /// by name.
    pub fn bind(
        &self,
        handler: &Handler,
        request: &Arc<IncomingRequest>,
        body: &Value,
    ) -> Result<BoundArgs, InvokeError> {
        let mut args = BoundArgs::new();
        for descriptor in handler.args() {
            if descriptor.is_request() {
                args.insert(descriptor.name(), Bound::Request(Arc::clone(request)));
                continue;
            }

            let strategy = self.registry.resolve(descriptor.name()).map_err(|_| {
                InvalidHandlerArgument {
                    handler: handler.name().to_string(),
                    argument: descriptor.name().to_string(),
                    declared_type: descriptor.declared_type().to_string(),
                }
            })?;

            let value = strategy(&ArgumentSource::new(request, body, descriptor.name()))?;
            args.insert(descriptor.name(), value);
        }
        Ok(args)
    }

    /// Binds the arguments of `handler` and calls it.
    ///
    /// The handler's own error is returned unchanged as
    /// [`InvokeError::Handler`].
    pub async fn invoke(
        &self,
        handler: &Handler,
        request: Arc<IncomingRequest>,
        body: Value,
    ) -> Result<Reply, InvokeError> {
        let args = self.bind(handler, &request, &body)?;
        tracing::trace!(handler = handler.name(), args = args.len(), "arguments bound");
        Ok(handler.call(args).await?)
    }
}
