//! Deferred handler results.
//!
//! A [`Reply`] holds a handler's return value without encoding it. Encoding
//! happens later, when the dispatcher reaches its serialization stage, so a
//! value that cannot be represented as JSON is reported there and not inside
//! the handler.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::SerializationError;

type Render = Box<dyn FnOnce() -> Result<Value, serde_json::Error> + Send>;

/// A handler result waiting to be encoded as JSON.
///
/// # Example
///
/// ```
/// use hermes_core::Reply;
/// use serde_json::json;
///
/// let reply = Reply::new(json!({"name": "Ivan"}));
/// assert_eq!(reply.render().unwrap(), json!({"name": "Ivan"}));
/// ```
pub struct Reply {
    type_name: &'static str,
    render: Render,
}

impl Reply {
    /// Wraps a serializable value.
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            render: Box::new(move || serde_json::to_value(&value)),
        }
    }

    /// Wraps an already encoded JSON value.
    #[must_use]
    pub fn json(value: Value) -> Self {
        Self {
            type_name: "serde_json::Value",
            render: Box::new(move || Ok(value)),
        }
    }

    /// Returns the name of the wrapped value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Transforms the encoded value once it has been rendered.
    ///
    /// The reply keeps the type name of the original value, so a failure
    /// while rendering still names the type the handler produced.
    pub fn try_map<F>(self, f: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, serde_json::Error> + Send + 'static,
    {
        let render = self.render;
        Self {
            type_name: self.type_name,
            render: Box::new(move || render().and_then(f)),
        }
    }

    /// Encodes the value.
    pub fn render(self) -> Result<Value, SerializationError> {
        let type_name = self.type_name;
        (self.render)().map_err(|e| SerializationError::new(type_name, e))
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
