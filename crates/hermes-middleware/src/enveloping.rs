//! Response enveloping.
//!
//! [`build_success`] and [`build_error`] produce the `{success, result, id}`
//! envelope. An [`ErrorBodyBuilder`] decides what body a failed request
//! gets: the bare `{error_type, error_message}` object in the raw modes, or
//! that object wrapped in a failed envelope.

use hermes_core::{ErrorBody, Reply, RequestContext, ResponseEnvelope};
use serde_json::Value;

use crate::error::DispatchError;

/// Wraps a handler result in a successful envelope.
///
/// ```
/// use hermes_middleware::build_success;
/// use serde_json::json;
///
/// let envelope = build_success(json!({"name": "Ivan"}), Some(4));
/// assert!(envelope.success);
/// assert_eq!(envelope.id, Some(4));
/// ```
#[must_use]
pub fn build_success(result: Value, id: Option<i64>) -> ResponseEnvelope<Value> {
    ResponseEnvelope::success(result, id)
}

/// Wraps a failure in a failed envelope.
#[must_use]
pub fn build_error(error: &DispatchError, id: Option<i64>) -> ResponseEnvelope<ErrorBody> {
    ResponseEnvelope::failure(error.to_body(), id)
}

/// Builds the body of a failed response.
pub trait ErrorBodyBuilder: Send + Sync + 'static {
    /// Returns the name of this builder, for logs.
    fn name(&self) -> &'static str;

    /// Builds the body for `error`.
    fn error_body(&self, error: &DispatchError, ctx: &RequestContext) -> Reply;
}

/// Error bodies as a bare `{error_type, error_message}` object.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainErrorBody;

impl ErrorBodyBuilder for PlainErrorBody {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn error_body(&self, error: &DispatchError, _ctx: &RequestContext) -> Reply {
        Reply::new(error.to_body())
    }
}

/// Error bodies wrapped in a failed envelope carrying the request's
/// envelope id.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopedErrorBody;

impl ErrorBodyBuilder for EnvelopedErrorBody {
    fn name(&self) -> &'static str {
        "enveloped"
    }

    fn error_body(&self, error: &DispatchError, ctx: &RequestContext) -> Reply {
        Reply::new(build_error(error, ctx.envelope_id()))
    }
}
