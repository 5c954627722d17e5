//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;

use crate::error::TestError;

/// A request ready to send to a [`TestClient`](crate::TestClient).
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
}

impl TestRequest {
    /// Starts a `GET` request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Converts into an `http::Request` with an in-memory body.
    #[must_use]
    pub fn into_http_request(self) -> http::Request<Bytes> {
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Builder for [`TestRequest`].
///
/// Invalid headers or an unserializable JSON body are reported by
/// [`build`](Self::build).
///
/// ```
/// use hermes_test::TestRequest;
///
/// let request = TestRequest::post("/create")
///     .json(&serde_json::json!({"data": {"name": "Ann"}}))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.uri.path(), "/create");
/// assert_eq!(request.headers["content-type"], "application/json");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(format!("invalid header name: {e}")),
            (_, Err(e)) => self.fail(format!("invalid header value: {e}")),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and the `application/json` content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(TestError::Json(e));
                }
            }
        }
        self.content_type("application/json")
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(TestError::RequestBuild(message));
        }
    }

    /// Builds the request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI: {e}")))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let request = TestRequest::get("/info/5")
            .header("X-Trace", "abc")
            .build()
            .unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.headers["x-trace"], "abc");
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_invalid_header_is_reported_at_build() {
        let err = TestRequest::get("/")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[test]
    fn test_invalid_uri() {
        assert!(TestRequest::get("http://[::1").build().is_err());
    }

    #[test]
    fn test_into_http_request() {
        let request = TestRequest::post("/read")
            .body("\"abc\"")
            .build()
            .unwrap()
            .into_http_request();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().path(), "/read");
        assert_eq!(request.body().as_ref(), b"\"abc\"");
    }
}
