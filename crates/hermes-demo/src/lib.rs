//! # Hermes Demo
//!
//! A small persons service showing the three dispatch modes:
//!
//! - `simple`: `POST /some_handler` and `POST /handler500`, handlers take
//!   `(request, body)`
//! - `kwargs`: `POST /create`, `POST /read` and `GET /info/{info_id}`,
//!   arguments bound by name
//! - `wraps`: the same routes inside request and response envelopes

#![doc(html_root_url = "https://docs.rs/hermes-demo/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod persons;
pub mod simple;

pub use app::{build_server, registry, server_for, STORAGE_KEY};
