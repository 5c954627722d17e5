//! HTTP types used by the dispatcher.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// Media type of every body the dispatcher writes.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// The HTTP response type produced by the dispatcher.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a JSON response from an encoded body.
    fn json(status: StatusCode, body: impl Into<Bytes>) -> Response;

    /// Creates a JSON response from a value.
    fn json_value(status: StatusCode, value: &serde_json::Value) -> Response;

    /// Creates a JSON error response in the `{error_type, error_message}`
    /// shape.
    fn json_error(status: StatusCode, error_type: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn json(status: StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = http::Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response
    }

    fn json_value(status: StatusCode, value: &serde_json::Value) -> Response {
        Self::json(status, value.to_string())
    }

    fn json_error(status: StatusCode, error_type: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error_type": error_type,
            "error_message": message,
        });
        Self::json_value(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_json_error_response() {
        let response = Response::json_error(StatusCode::NOT_FOUND, "NotFound", "no route for /x");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_type"], "NotFound");
        assert_eq!(body["error_message"], "no route for /x");
    }
}
