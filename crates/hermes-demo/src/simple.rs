//! Handlers with the fixed `(request, body)` signature.

use hermes_core::{Handler, HandlerError, Reply};

/// Raised by [`handler500`] on every call.
#[derive(Debug, thiserror::Error)]
#[error("Example of a 500 error")]
pub struct ExampleFailure;

/// Echoes the body back.
pub fn some_handler() -> Handler {
    Handler::plain("some_handler", |_request, data| async move { Ok(Reply::json(data)) })
}

/// Always fails with [`ExampleFailure`].
pub fn handler500() -> Handler {
    Handler::plain("handler500", |_request, _data| async move {
        Err::<Reply, _>(HandlerError::from(ExampleFailure))
    })
}
