//! Argument resolver registry.
//!
//! The [`ArgumentRegistry`] maps argument names to extraction strategies. It
//! is filled once at start-up and then shared read-only between requests,
//! usually behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use hermes_bind::ArgumentRegistry;
//!
//! let registry = ArgumentRegistry::new()
//!     .with_request_body("data")
//!     .with_app_key("storage")
//!     .with_path_param("info_id");
//!
//! assert!(registry.contains("storage"));
//! assert_eq!(registry.names().collect::<Vec<_>>(), ["data", "storage", "info_id"]);
//! ```

use std::fmt;
use std::sync::Arc;

use hermes_core::{Bound, IncomingRequest};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ExtractionError, UnknownArgument};

/// What a strategy can read while extracting one argument.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentSource<'a> {
    request: &'a Arc<IncomingRequest>,
    body: &'a Value,
    name: &'a str,
}

impl<'a> ArgumentSource<'a> {
    /// Creates a source for the argument `name`.
    #[must_use]
    pub const fn new(request: &'a Arc<IncomingRequest>, body: &'a Value, name: &'a str) -> Self {
        Self {
            request,
            body,
            name,
        }
    }

    /// Returns the incoming request.
    #[must_use]
    pub const fn request(&self) -> &'a Arc<IncomingRequest> {
        self.request
    }

    /// Returns the decoded request body.
    #[must_use]
    pub const fn body(&self) -> &'a Value {
        self.body
    }

    /// Returns the name of the argument being extracted.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }
}

/// An extraction strategy.
pub type Strategy =
    Arc<dyn Fn(&ArgumentSource<'_>) -> Result<Bound, ExtractionError> + Send + Sync>;

/// Name to strategy table.
#[derive(Clone, Default)]
pub struct ArgumentRegistry {
    strategies: IndexMap<String, Strategy>,
}

impl ArgumentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a strategy. A later registration of the same name
    /// replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, strategy: F)
    where
        F: Fn(&ArgumentSource<'_>) -> Result<Bound, ExtractionError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.strategies.insert(name.clone(), Arc::new(strategy)).is_some() {
            tracing::debug!(argument = %name, "argument strategy replaced");
        }
    }

    /// Binds `name` to the decoded request body.
    pub fn register_request_body(&mut self, name: impl Into<String>) {
        self.register(name, |source| Ok(Bound::Value(source.body().clone())));
    }

    /// Binds `name` to the application state entry with the same name.
    pub fn register_app_key(&mut self, name: impl Into<String>) {
        self.register(name, |source| {
            source
                .request()
                .state()
                .get_shared(source.name())
                .map(Bound::Shared)
                .ok_or_else(|| ExtractionError::MissingStateKey {
                    key: source.name().to_string(),
                })
        });
    }

    /// Binds `name` to the path parameter with the same name.
    ///
    /// The value is bound as a JSON string; typed reads coerce it.
    pub fn register_path_param(&mut self, name: impl Into<String>) {
        self.register(name, |source| {
            source
                .request()
                .path_param(source.name())
                .map(|value| Bound::Value(Value::String(value.to_string())))
                .ok_or_else(|| ExtractionError::MissingPathParam {
                    name: source.name().to_string(),
                })
        });
    }

    /// Chained form of [`register_request_body`](Self::register_request_body).
    #[must_use]
    pub fn with_request_body(mut self, name: impl Into<String>) -> Self {
        self.register_request_body(name);
        self
    }

    /// Chained form of [`register_app_key`](Self::register_app_key).
    #[must_use]
    pub fn with_app_key(mut self, name: impl Into<String>) -> Self {
        self.register_app_key(name);
        self
    }

    /// Chained form of [`register_path_param`](Self::register_path_param).
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>) -> Self {
        self.register_path_param(name);
        self
    }

    /// Returns the strategy bound to `name`.
    pub fn resolve(&self, name: &str) -> Result<&Strategy, UnknownArgument> {
        self.strategies.get(name).ok_or_else(|| UnknownArgument {
            name: name.to_string(),
        })
    }

    /// Returns `true` if `name` has a strategy.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl fmt::Debug for ArgumentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentRegistry")
            .field("names", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::AppState;
    use serde_json::json;

    fn request() -> Arc<IncomingRequest> {
        let state = AppState::new().with("storage", Arc::new(41_u32));
        Arc::new(
            IncomingRequest::builder()
                .uri("/info/5")
                .path_param("info_id", "5")
                .state(Arc::new(state))
                .build(),
        )
    }

    fn extract(registry: &ArgumentRegistry, name: &str, body: &Value) -> Result<Bound, ExtractionError> {
        let request = request();
        let strategy = registry.resolve(name).unwrap();
        strategy(&ArgumentSource::new(&request, body, name))
    }

    #[test]
    fn test_request_body_strategy() {
        let registry = ArgumentRegistry::new().with_request_body("data");
        let bound = extract(&registry, "data", &json!({"name": "Ivan"})).unwrap();
        assert!(matches!(bound, Bound::Value(v) if v == json!({"name": "Ivan"})));
    }

    #[test]
    fn test_app_key_strategy() {
        let registry = ArgumentRegistry::new().with_app_key("storage");
        let bound = extract(&registry, "storage", &Value::Null).unwrap();
        let Bound::Shared(shared) = bound else {
            panic!("expected a shared binding");
        };
        assert_eq!(*shared.downcast::<u32>().unwrap(), 41);
    }

    #[test]
    fn test_app_key_missing() {
        let registry = ArgumentRegistry::new().with_app_key("db");
        let error = extract(&registry, "db", &Value::Null).unwrap_err();
        assert_eq!(error, ExtractionError::MissingStateKey { key: "db".into() });
    }

    #[test]
    fn test_path_param_strategy() {
        let registry = ArgumentRegistry::new().with_path_param("info_id");
        let bound = extract(&registry, "info_id", &Value::Null).unwrap();
        assert!(matches!(bound, Bound::Value(Value::String(s)) if s == "5"));

        let registry = ArgumentRegistry::new().with_path_param("user_id");
        assert!(extract(&registry, "user_id", &Value::Null).is_err());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ArgumentRegistry::new();
        let error = registry.resolve("nope").err().unwrap();
        assert_eq!(error.name, "nope");
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ArgumentRegistry::new();
        registry.register("x", |_| Ok(Bound::Value(json!(1))));
        registry.register("x", |_| Ok(Bound::Value(json!(2))));
        assert_eq!(registry.len(), 1);

        let bound = extract(&registry, "x", &Value::Null).unwrap();
        assert!(matches!(bound, Bound::Value(v) if v == json!(2)));
    }
}
