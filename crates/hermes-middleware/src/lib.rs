//! # Hermes Middleware
//!
//! The dispatcher that sits between the router and the handlers.
//!
//! For every request routed to a [`hermes_core::Handler`] the [`Dispatcher`]
//! decodes the JSON body, runs the handler through a [`HandlerRunner`],
//! builds the response body (with an [`ErrorBodyBuilder`] on failure) and
//! encodes it. The status code is decided once, from the [`DispatchError`]
//! classification: 400 for malformed bodies and input validation failures,
//! 500 for everything else.
//!
//! Three compositions are provided:
//!
//! | Constructor | Runner | Error body |
//! |---|---|---|
//! | [`Dispatcher::plain`] | [`PlainRunner`] | [`PlainErrorBody`] |
//! | [`Dispatcher::kwargs`] | [`KwargsRunner`] | [`PlainErrorBody`] |
//! | [`Dispatcher::enveloped`] | [`EnvelopedRunner`] | [`EnvelopedErrorBody`] |

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod enveloping;
mod error;
mod runner;
pub mod types;

pub use dispatcher::{Dispatcher, Passthrough, Stage, Target};
pub use enveloping::{build_error, build_success, EnvelopedErrorBody, ErrorBodyBuilder, PlainErrorBody};
pub use error::DispatchError;
pub use runner::{EnvelopedRunner, HandlerRunner, KwargsRunner, PlainRunner};
pub use types::{Response, ResponseExt, JSON_CONTENT_TYPE};
