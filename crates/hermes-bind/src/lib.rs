//! # Hermes Bind
//!
//! Name-based argument binding for Hermes handlers.
//!
//! - [`ArgumentRegistry`] - Maps argument names to extraction strategies
//! - [`HandlerInvoker`] - Resolves a handler's declared arguments and calls it
//!
//! Arguments declared as the incoming request are always bound to the
//! request itself. Every other argument needs a registered strategy; an
//! argument without one fails with [`InvalidHandlerArgument`] before the
//! handler runs.

#![doc(html_root_url = "https://docs.rs/hermes-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod invoker;
mod registry;

pub use error::{ExtractionError, ExtractionSource, InvalidHandlerArgument, UnknownArgument};
pub use invoker::{HandlerInvoker, InvokeError};
pub use registry::{ArgumentRegistry, ArgumentSource, Strategy};
