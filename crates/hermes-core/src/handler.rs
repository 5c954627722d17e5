//! Handlers and their declared arguments.
//!
//! A [`Handler`] is an async function plus an explicit list of the arguments
//! it needs. Each argument is an [`ArgDescriptor`]: a name and a declared
//! kind. The binding layer reads the descriptors, resolves every argument
//! before the function runs and passes the results in as [`BoundArgs`].
//!
//! # Example
//!
//! ```
//! use hermes_core::{BoundArgs, Handler, HandlerResult, Reply};
//!
//! async fn info(args: BoundArgs) -> HandlerResult<Reply> {
//!     let info_id: i64 = args.value("info_id")?;
//!     let request = args.request("request")?;
//!     Ok(Reply::new(format!("info_id={info_id} and request={request}")))
//! }
//!
//! let handler = Handler::builder("info")
//!     .arg::<i64>("info_id")
//!     .request("request")
//!     .build(info);
//!
//! assert_eq!(handler.name(), "info");
//! assert_eq!(handler.args().len(), 2);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::{HandlerResult, InputDataValidationError};
use crate::reply::Reply;
use crate::request::IncomingRequest;
use crate::state::SharedValue;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type HandlerFn = dyn Fn(BoundArgs) -> BoxFuture<'static, HandlerResult<Reply>> + Send + Sync;

/// Declared kind of a handler argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// The incoming request itself.
    Request,
    /// A value of the named Rust type.
    Typed(&'static str),
}

/// One declared handler argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDescriptor {
    name: String,
    kind: ArgKind,
}

impl ArgDescriptor {
    /// Declares an argument of type `T`.
    #[must_use]
    pub fn typed<T: ?Sized>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgKind::Typed(std::any::type_name::<T>()),
        }
    }

    /// Declares an argument that receives the incoming request.
    #[must_use]
    pub fn request(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgKind::Request,
        }
    }

    /// Returns the argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared kind.
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        self.kind
    }

    /// Returns `true` for request arguments.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self.kind, ArgKind::Request)
    }

    /// Returns the declared type as shown in error messages.
    #[must_use]
    pub const fn declared_type(&self) -> &'static str {
        match self.kind {
            ArgKind::Request => "hermes_core::IncomingRequest",
            ArgKind::Typed(name) => name,
        }
    }
}

/// A resolved argument value.
#[derive(Clone)]
pub enum Bound {
    /// The incoming request.
    Request(Arc<IncomingRequest>),
    /// A JSON value, decoded into the declared type on access.
    Value(Value),
    /// A shared application resource.
    Shared(SharedValue),
}

impl Bound {
    const fn kind_name(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Value(_) => "value",
            Self::Shared(_) => "shared resource",
        }
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(request) => f.debug_tuple("Request").field(&request.to_string()).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

/// Failure to read a bound argument.
///
/// These indicate a mismatch between a handler's descriptors and the code
/// that reads its arguments, so they surface as server errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// No argument was bound under the name.
    #[error("argument '{name}' was not bound")]
    Missing {
        /// Argument name.
        name: String,
    },

    /// The argument was bound to a different kind of value.
    #[error("argument '{name}' is a {actual}, not a {expected}")]
    WrongKind {
        /// Argument name.
        name: String,
        /// What the caller asked for.
        expected: &'static str,
        /// What was bound.
        actual: &'static str,
    },
}

/// Arguments resolved for one handler call, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    args: IndexMap<String, Bound>,
}

impl BoundArgs {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier binding.
    pub fn insert(&mut self, name: impl Into<String>, value: Bound) {
        self.args.insert(name.into(), value);
    }

    /// Returns the number of bound arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Returns the bound names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(String::as_str)
    }

    /// Returns the binding for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bound> {
        self.args.get(name)
    }

    fn lookup(&self, name: &str) -> Result<&Bound, ArgumentError> {
        self.args.get(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })
    }

    /// Returns the request bound under `name`.
    pub fn request(&self, name: &str) -> HandlerResult<Arc<IncomingRequest>> {
        match self.lookup(name)? {
            Bound::Request(request) => Ok(Arc::clone(request)),
            other => Err(wrong_kind(name, "request", other).into()),
        }
    }

    /// Returns the JSON value bound under `name` without decoding it.
    pub fn raw_value(&self, name: &str) -> HandlerResult<&Value> {
        match self.lookup(name)? {
            Bound::Value(value) => Ok(value),
            other => Err(wrong_kind(name, "value", other).into()),
        }
    }

    /// Decodes the value bound under `name` into `T`.
    ///
    /// A string that does not decode directly is parsed as JSON text and
    /// decoded again, so a path parameter `"42"` satisfies an integer
    /// argument. A value that still does not fit `T` is an input validation
    /// failure.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> HandlerResult<T> {
        let raw = self.raw_value(name)?;
        match serde_json::from_value::<T>(raw.clone()) {
            Ok(decoded) => Ok(decoded),
            Err(error) => {
                if let Value::String(text) = raw {
                    if let Ok(decoded) = serde_json::from_str::<T>(text) {
                        return Ok(decoded);
                    }
                }
                Err(InputDataValidationError::described(
                    "ValidationError",
                    format_args!("argument '{name}': {error}"),
                )
                .into())
            }
        }
    }

    /// Returns the shared resource bound under `name` as `Arc<T>`.
    pub fn shared<T: Send + Sync + 'static>(&self, name: &str) -> HandlerResult<Arc<T>> {
        match self.lookup(name)? {
            Bound::Shared(value) => Arc::clone(value).downcast::<T>().map_err(|_| {
                ArgumentError::WrongKind {
                    name: name.to_string(),
                    expected: std::any::type_name::<T>(),
                    actual: "shared resource",
                }
                .into()
            }),
            other => Err(wrong_kind(name, "shared resource", other).into()),
        }
    }
}

fn wrong_kind(name: &str, expected: &'static str, actual: &Bound) -> ArgumentError {
    ArgumentError::WrongKind {
        name: name.to_string(),
        expected,
        actual: actual.kind_name(),
    }
}

/// An async handler with its declared arguments.
///
/// Cloning is cheap; the function is shared.
#[derive(Clone)]
pub struct Handler {
    name: String,
    args: Vec<ArgDescriptor>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Starts declaring a handler named `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> HandlerBuilder {
        HandlerBuilder {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates a handler taking the request and the decoded body positionally.
    ///
    /// Its descriptors are a request argument named `request` followed by a
    /// JSON argument named `body`.
    pub fn plain<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<IncomingRequest>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Reply>> + Send + 'static,
    {
        let f = Arc::new(f);
        Self::builder(name)
            .request("request")
            .arg::<Value>("body")
            .build(move |args: BoundArgs| {
                let f = Arc::clone(&f);
                async move {
                    let request = args.request("request")?;
                    let body = args.raw_value("body")?.clone();
                    f(request, body).await
                }
            })
    }

    /// Returns the handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared arguments in order.
    #[must_use]
    pub fn args(&self) -> &[ArgDescriptor] {
        &self.args
    }

    /// Calls the handler with already resolved arguments.
    pub fn call(&self, args: BoundArgs) -> BoxFuture<'static, HandlerResult<Reply>> {
        (self.func)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Handler`].
#[derive(Debug)]
pub struct HandlerBuilder {
    name: String,
    args: Vec<ArgDescriptor>,
}

impl HandlerBuilder {
    /// Declares an argument of type `T`.
    #[must_use]
    pub fn arg<T: ?Sized>(mut self, name: impl Into<String>) -> Self {
        self.args.push(ArgDescriptor::typed::<T>(name));
        self
    }

    /// Declares an argument receiving the incoming request.
    #[must_use]
    pub fn request(mut self, name: impl Into<String>) -> Self {
        self.args.push(ArgDescriptor::request(name));
        self
    }

    /// Adds a prepared descriptor.
    #[must_use]
    pub fn descriptor(mut self, descriptor: ArgDescriptor) -> Self {
        self.args.push(descriptor);
        self
    }

    /// Finishes the handler with its function.
    pub fn build<F, Fut>(self, f: F) -> Handler
    where
        F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<Reply>> + Send + 'static,
    {
        Handler {
            name: self.name,
            args: self.args,
            func: Arc::new(move |args| Box::pin(f(args))),
        }
    }
}
