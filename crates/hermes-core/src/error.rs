//! Error types for Hermes handlers.
//!
//! Handlers return [`HandlerResult`], whose error side is [`HandlerError`].
//! A `HandlerError` is produced from any standard error with `?` and remembers
//! the concrete type name of the error it was built from, so that the error
//! body sent to the client can name the failure.
//!
//! Only two tiers exist:
//!
//! | [`ErrorTier`] | Produced by | HTTP status |
//! |---|---|---|
//! | `Validation` | [`InputDataValidationError`] | 400 |
//! | `Domain` | every other error | 500 |

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for handler code.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Status tier of a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTier {
    /// Input data failed validation.
    Validation,
    /// Any other failure raised by application logic.
    Domain,
}

impl ErrorTier {
    /// Returns the HTTP status code for this tier.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Domain => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Input data did not pass validation.
///
/// This is the only error type that maps to `400 Bad Request` when it
/// leaves a handler.
///
/// # Example
///
/// ```
/// use hermes_core::{ErrorTier, HandlerError, InputDataValidationError};
///
/// let error: HandlerError = InputDataValidationError::new("name is required").into();
/// assert_eq!(error.tier(), ErrorTier::Validation);
/// assert_eq!(error.message(), "name is required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InputDataValidationError {
    message: String,
}

impl InputDataValidationError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates a validation error in the `"<ErrorType> - <detail>"` form.
    #[must_use]
    pub fn described(error_type: &str, detail: impl fmt::Display) -> Self {
        Self::new(format!("{error_type} - {detail}"))
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned from a handler.
///
/// Any `std::error::Error + Send + Sync + 'static` converts into a
/// `HandlerError` through `?`. Because of that blanket conversion this type
/// does not implement `std::error::Error` itself.
///
/// # Example
///
/// ```
/// use hermes_core::{ErrorTier, HandlerError, HandlerResult};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("Person with id={0} not found!")]
/// struct PersonNotFound(u32);
///
/// fn read(id: u32) -> HandlerResult<()> {
///     Err(PersonNotFound(id).into())
/// }
///
/// let error = read(7).unwrap_err();
/// assert_eq!(error.tier(), ErrorTier::Domain);
/// assert!(error.type_name().ends_with("PersonNotFound"));
/// assert_eq!(error.message(), "Person with id=7 not found!");
/// ```
pub struct HandlerError {
    tier: ErrorTier,
    type_name: Cow<'static, str>,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HandlerError {
    /// Creates a domain-tier error from a plain message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            tier: ErrorTier::Domain,
            type_name: Cow::Borrowed("Error"),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error with an explicit tier and type name.
    #[must_use]
    pub fn with_type(
        tier: ErrorTier,
        type_name: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tier,
            type_name: type_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns the status tier.
    #[must_use]
    pub const fn tier(&self) -> ErrorTier {
        self.tier
    }

    /// Returns `true` for validation-tier errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.tier == ErrorTier::Validation
    }

    /// Returns the name of the error type this error was built from.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the wrapped error, if there is one.
    #[must_use]
    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Attempts to borrow the wrapped error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Builds the error body sent to clients.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.type_name.as_ref(), self.message.as_str())
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let (tier, type_name) = if TypeId::of::<E>() == TypeId::of::<InputDataValidationError>() {
            (ErrorTier::Validation, "InputDataValidationError")
        } else {
            (ErrorTier::Domain, std::any::type_name::<E>())
        };
        Self {
            tier,
            type_name: Cow::Borrowed(type_name),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("tier", &self.tier)
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Body describing a failure.
///
/// Sent as-is in the raw modes and as the `result` of a failed response
/// envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorBody {
    /// Name of the error type.
    pub error_type: String,
    /// Human-readable error message.
    pub error_message: String,
}

impl ErrorBody {
    /// Creates an error body.
    #[must_use]
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
        }
    }
}

/// A value could not be encoded as JSON.
#[derive(Debug, Error)]
#[error("Object of type {type_name} is not JSON serializable: {source}")]
pub struct SerializationError {
    type_name: &'static str,
    #[source]
    source: serde_json::Error,
}

impl SerializationError {
    /// Creates a serialization error for a value of the named type.
    #[must_use]
    pub fn new(type_name: &'static str, source: serde_json::Error) -> Self {
        Self { type_name, source }
    }

    /// Returns the name of the type that failed to serialize.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}
