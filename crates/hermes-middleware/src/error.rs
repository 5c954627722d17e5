//! Dispatch failures and their status classification.
//!
//! Every failure on the way from request body to response body ends up as a
//! [`DispatchError`]. The dispatcher classifies it exactly once:
//!
//! | Variant | Status |
//! |---|---|
//! | `MalformedBody` | 400 |
//! | `InputValidation` | 400 |
//! | `Handler` with a validation-tier error | 400 |
//! | `Handler` with any other error | 500 |
//! | `InvalidHandlerArgument` | 500 |
//! | `Extraction` | 500 |
//! | `Serialization` | 500 |

use hermes_bind::{ExtractionError, InvalidHandlerArgument, InvokeError};
use hermes_core::{ErrorBody, HandlerError, InputDataValidationError, SerializationError};
use http::StatusCode;
use thiserror::Error;

/// A failure while dispatching one request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request body is not valid JSON.
    #[error("{0}")]
    MalformedBody(#[source] serde_json::Error),

    /// The request envelope or a declared argument failed validation.
    #[error(transparent)]
    InputValidation(#[from] InputDataValidationError),

    /// The handler declares an argument nothing can supply.
    #[error(transparent)]
    InvalidHandlerArgument(#[from] InvalidHandlerArgument),

    /// An extraction strategy failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The handler returned an error.
    #[error("{0}")]
    Handler(HandlerError),

    /// The response body could not be encoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl DispatchError {
    /// Returns the HTTP status code for this failure.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) | Self::InputValidation(_) => StatusCode::BAD_REQUEST,
            Self::Handler(error) => error.tier().status_code(),
            Self::InvalidHandlerArgument(_) | Self::Extraction(_) | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the name reported as `error_type`.
    ///
    /// Handler errors report the type name of the error the handler
    /// returned.
    #[must_use]
    pub fn error_type(&self) -> &str {
        match self {
            Self::MalformedBody(_) => "MalformedBody",
            Self::InputValidation(_) => "InputDataValidationError",
            Self::InvalidHandlerArgument(_) => "InvalidHandlerArgument",
            Self::Extraction(_) => "ExtractionError",
            Self::Handler(error) => error.type_name(),
            Self::Serialization(_) => "SerializationFailure",
        }
    }

    /// Builds the error body.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.error_type(), self.to_string())
    }
}

impl From<HandlerError> for DispatchError {
    fn from(error: HandlerError) -> Self {
        Self::Handler(error)
    }
}

impl From<InvokeError> for DispatchError {
    fn from(error: InvokeError) -> Self {
        match error {
            InvokeError::InvalidArgument(e) => Self::InvalidHandlerArgument(e),
            InvokeError::Extraction(e) => Self::Extraction(e),
            InvokeError::Handler(e) => Self::Handler(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("Person with id=1 not found!")]
    struct PersonNotFound;

    #[test]
    fn test_malformed_body() {
        let error = DispatchError::MalformedBody(serde_json::from_slice::<serde_json::Value>(b"").unwrap_err());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_body().error_type, "MalformedBody");
        assert!(error.to_string().contains("EOF"));
    }

    #[test]
    fn test_handler_tiers() {
        let domain = DispatchError::from(HandlerError::from(PersonNotFound));
        assert_eq!(domain.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(domain.error_type().ends_with("PersonNotFound"));
        assert_eq!(domain.to_body().error_message, "Person with id=1 not found!");

        let validation = DispatchError::from(HandlerError::from(InputDataValidationError::new("bad")));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_body(), ErrorBody::new("InputDataValidationError", "bad"));
    }

    #[test]
    fn test_invalid_argument_is_server_error() {
        let error = DispatchError::from(InvokeError::InvalidArgument(InvalidHandlerArgument {
            handler: "create".into(),
            argument: "db".into(),
            declared_type: "Db".into(),
        }));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error_type(), "InvalidHandlerArgument");
    }

    #[test]
    fn test_input_validation() {
        let error = DispatchError::from(InputDataValidationError::described("ValidationError", "id"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_body(), ErrorBody::new("InputDataValidationError", "ValidationError - id"));
    }
}
