//! In-memory test client.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use hermes_core::BoxFuture;
use hermes_middleware::Response;
use hermes_server::Server;
use http::Method;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Function answering test requests.
pub type TestHandler = Arc<dyn Fn(TestRequest) -> BoxFuture<'static, Response> + Send + Sync>;

/// Sends requests to a server or a closure without opening a socket.
///
/// # Example
///
/// ```
/// use hermes_core::{Handler, Reply};
/// use hermes_server::Server;
/// use hermes_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let server = Server::builder()
///     .post("/echo", Handler::plain("echo", |_r, body| async move { Ok(Reply::json(body)) }))
///     .build();
/// let client = TestClient::from_server(server);
///
/// let response = client.post("/echo").body(r#"{"a":1}"#).send().await;
/// assert_eq!(response.status_code(), 200);
/// assert_eq!(response.json_value().unwrap()["a"], 1);
/// # });
/// ```
#[must_use]
pub struct TestClient {
    handler: TestHandler,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client answering with a closure.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(TestRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |request| Box::pin(handler(request))),
            default_headers: Vec::new(),
        }
    }

    /// Creates a client that runs every request through a server's
    /// routing and dispatch.
    pub fn from_server(server: impl Into<Arc<Server>>) -> Self {
        let server = server.into();
        Self::new(move |request: TestRequest| {
            let server = Arc::clone(&server);
            async move { server.handle(request.into_http_request()).await }
        })
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest { client: self, builder }
    }

    async fn send_internal(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = (self.handler)(request).await;
        TestResponse::from_http(response).await
    }
}

/// A request bound to a [`TestClient`].
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    /// Use [`try_send`](Self::try_send) to get the error instead.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request, returning build and read errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_internal(request).await
    }
}
