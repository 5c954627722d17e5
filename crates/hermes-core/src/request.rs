//! The incoming request as seen by handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

use crate::context::RequestId;
use crate::state::AppState;

/// An HTTP request after routing, with its body fully read.
///
/// Handlers that declare a request argument receive this value behind an
/// `Arc`. It exposes the method, URI, headers, raw body, the path parameters
/// captured by the router and the application state.
///
/// # Example
///
/// ```
/// use hermes_core::IncomingRequest;
/// use http::Method;
///
/// let request = IncomingRequest::builder()
///     .method(Method::GET)
///     .uri("/info/42")
///     .path_param("info_id", "42")
///     .build();
///
/// assert_eq!(request.path_param("info_id"), Some("42"));
/// assert_eq!(request.to_string(), "<Request GET /info/42 >");
/// ```
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: HashMap<String, String>,
    state: Arc<AppState>,
    request_id: RequestId,
}

impl IncomingRequest {
    /// Starts building a request.
    #[must_use]
    pub fn builder() -> IncomingRequestBuilder {
        IncomingRequestBuilder::default()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw request body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a path parameter captured by the router.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Returns all captured path parameters.
    #[must_use]
    pub const fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Returns the application state.
    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl fmt::Display for IncomingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Request {} {} >", self.method, self.uri.path())
    }
}

/// Builder for [`IncomingRequest`].
#[derive(Debug, Default)]
pub struct IncomingRequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: HashMap<String, String>,
    state: Option<Arc<AppState>>,
    request_id: Option<RequestId>,
}

impl IncomingRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI.
    ///
    /// An unparseable URI leaves the current one in place.
    #[must_use]
    pub fn uri(mut self, uri: impl AsRef<str>) -> Self {
        if let Ok(uri) = uri.as_ref().parse() {
            self.uri = uri;
        }
        self
    }

    /// Sets an already parsed URI.
    #[must_use]
    pub fn parsed_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Replaces all path parameters.
    #[must_use]
    pub fn path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    /// Sets the application state.
    #[must_use]
    pub fn state(mut self, state: Arc<AppState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the request id. A fresh id is generated otherwise.
    #[must_use]
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> IncomingRequest {
        IncomingRequest {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
            state: self.state.unwrap_or_default(),
            request_id: self.request_id.unwrap_or_default(),
        }
    }
}
