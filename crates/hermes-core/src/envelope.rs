//! Request and response envelopes.
//!
//! In envelope mode a request body looks like `{"data": ..., "id": 7}` and a
//! response body like `{"success": true, "result": ..., "id": 7}`. The `id`
//! is an opaque correlation value echoed back verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wrapper around a handler's input.
///
/// Unknown fields are rejected and `id` must be a JSON integer; strings and
/// floats are not coerced.
///
/// # Example
///
/// ```
/// use hermes_core::RequestEnvelope;
/// use serde_json::json;
///
/// let envelope = RequestEnvelope::from_value(json!({"data": {"name": "Ivan"}, "id": 3})).unwrap();
/// assert_eq!(envelope.id, Some(3));
/// assert_eq!(envelope.data["name"], "Ivan");
///
/// assert!(RequestEnvelope::from_value(json!({"data": 1, "id": "3"})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestEnvelope {
    /// Handler input.
    #[serde(default)]
    pub data: Value,
    /// Correlation id.
    #[serde(default)]
    pub id: Option<i64>,
}

impl RequestEnvelope {
    /// Parses an envelope from a decoded JSON body.
    ///
    /// Only a JSON object is an envelope; arrays are not read positionally.
    pub fn from_value(body: Value) -> Result<Self, serde_json::Error> {
        if !body.is_object() {
            return Err(serde::de::Error::custom(format!(
                "expected an envelope object, found {}",
                json_kind(&body)
            )));
        }
        serde_json::from_value(body)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Uniform wrapper around a handler's output or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseEnvelope<T> {
    /// Whether the handler succeeded.
    pub success: bool,
    /// Handler result, or an [`ErrorBody`](crate::ErrorBody) on failure.
    pub result: T,
    /// Correlation id copied from the request envelope.
    pub id: Option<i64>,
}

impl<T> ResponseEnvelope<T> {
    /// Creates a successful envelope.
    pub fn success(result: T, id: Option<i64>) -> Self {
        Self {
            success: true,
            result,
            id,
        }
    }

    /// Creates a failed envelope.
    pub fn failure(result: T, id: Option<i64>) -> Self {
        Self {
            success: false,
            result,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorBody;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_defaults() {
        let envelope = RequestEnvelope::from_value(json!({})).unwrap();
        assert_eq!(envelope.data, Value::Null);
        assert_eq!(envelope.id, None);
    }

    #[test]
    fn test_request_envelope_rejects_extra_fields() {
        let result = RequestEnvelope::from_value(json!({"data": 1, "ids": 2}));
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn test_request_envelope_id_is_strict() {
        assert!(RequestEnvelope::from_value(json!({"id": 1.5})).is_err());
        assert!(RequestEnvelope::from_value(json!({"id": true})).is_err());
        assert!(RequestEnvelope::from_value(json!({"id": "1"})).is_err());
    }

    #[test]
    fn test_request_envelope_requires_object() {
        assert!(RequestEnvelope::from_value(json!("any json")).is_err());
        assert!(RequestEnvelope::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_response_envelope_null_id_is_serialized() {
        let text = serde_json::to_string(&ResponseEnvelope::success(json!(1), None)).unwrap();
        assert_eq!(text, r#"{"success":true,"result":1,"id":null}"#);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = ResponseEnvelope::failure(ErrorBody::new("E", "boom"), Some(9));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "result": {"error_type": "E", "error_message": "boom"},
                "id": 9
            })
        );
    }

    proptest! {
        #[test]
        fn prop_response_envelope_round_trip(
            id in proptest::option::of(any::<i32>()),
            success in any::<bool>(),
            name in "[a-zA-Z ]{0,16}",
        ) {
            let original = ResponseEnvelope {
                success,
                result: json!({"name": name}),
                id: id.map(i64::from),
            };
            let text = serde_json::to_string(&original).unwrap();
            let decoded: ResponseEnvelope<Value> = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(decoded, original);
        }
    }
}
