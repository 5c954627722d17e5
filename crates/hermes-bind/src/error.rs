//! Binding error types.

use std::fmt;

use thiserror::Error;

/// Where an extraction strategy was reading from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The decoded request body.
    Body,
    /// Application state.
    State,
    /// Path parameters captured by the router.
    Path,
    /// A custom strategy.
    Other,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::State => write!(f, "state"),
            Self::Path => write!(f, "path"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// An extraction strategy could not produce a value.
///
/// Strategies run before the handler, so this always means the handler was
/// not called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The application state has no entry under the argument name.
    #[error("KeyError - application state has no key '{key}'")]
    MissingStateKey {
        /// The missing key.
        key: String,
    },

    /// The router captured no path parameter with the argument name.
    #[error("KeyError - route has no path parameter '{name}'")]
    MissingPathParam {
        /// The missing parameter.
        name: String,
    },

    /// A custom strategy failed.
    #[error("{source_kind} extraction of '{argument}' failed: {reason}")]
    Custom {
        /// Where the strategy was reading from.
        source_kind: ExtractionSource,
        /// The argument being extracted.
        argument: String,
        /// Why it failed.
        reason: String,
    },
}

impl ExtractionError {
    /// Creates a custom extraction failure.
    #[must_use]
    pub fn custom(
        source_kind: ExtractionSource,
        argument: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Custom {
            source_kind,
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Returns where the strategy was reading from.
    #[must_use]
    pub const fn extraction_source(&self) -> ExtractionSource {
        match self {
            Self::MissingStateKey { .. } => ExtractionSource::State,
            Self::MissingPathParam { .. } => ExtractionSource::Path,
            Self::Custom { source_kind, .. } => *source_kind,
        }
    }
}

/// No strategy is registered under a name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no argument strategy registered for '{name}'")]
pub struct UnknownArgument {
    /// The unresolved name.
    pub name: String,
}

/// A handler declares an argument nothing can supply.
///
/// Raised before the handler runs. It is a configuration fault of the
/// service, not of the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("KeyError - Invalid handler '{handler}' argument: '{argument}': {declared_type}")]
pub struct InvalidHandlerArgument {
    /// Handler name.
    pub handler: String,
    /// Argument name.
    pub argument: String,
    /// Declared argument type.
    pub declared_type: String,
}
