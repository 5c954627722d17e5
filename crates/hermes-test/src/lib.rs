//! # Hermes Test
//!
//! In-memory testing for Hermes services. A [`TestClient`] drives a
//! [`hermes_server::Server`] through routing and dispatch without binding a
//! port, and returns fully read [`TestResponse`]s.

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, TestHandler};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
