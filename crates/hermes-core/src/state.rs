//! Named application state.
//!
//! Long-lived resources such as a storage handle are registered on an
//! [`AppState`] at start-up under a string key and handed to handlers that
//! declare an argument of the same name. The state is populated before the
//! server starts and only read afterwards.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::AppState;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use parking_lot::RwLock;
//!
//! type Storage = RwLock<HashMap<String, String>>;
//!
//! let mut state = AppState::new();
//! state.insert("storage", Arc::new(Storage::default()));
//!
//! let storage: Arc<Storage> = state.get("storage").unwrap();
//! storage.write().insert("k".into(), "v".into());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A shared, type-erased state entry.
pub type SharedValue = Arc<dyn Any + Send + Sync>;

/// Failure to read an application state entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Nothing is registered under the key.
    #[error("application state has no entry '{key}'")]
    Missing {
        /// The requested key.
        key: String,
    },

    /// The entry exists but holds another type.
    #[error("application state entry '{key}' is not a {expected}")]
    TypeMismatch {
        /// The requested key.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
    },
}

/// Application-wide state keyed by name.
///
/// Entries are `Arc`-wrapped so the same resource is shared by every
/// request. Interior mutability, if the resource needs it, belongs to the
/// resource itself.
#[derive(Default, Clone)]
pub struct AppState {
    entries: HashMap<String, SharedValue>,
}

impl AppState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry, replacing any previous entry with the same key.
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: Arc<T>) {
        self.entries.insert(key.into(), value);
    }

    /// Registers an entry and returns the state, for chained construction.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, key: impl Into<String>, value: Arc<T>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the type-erased entry for `key`.
    #[must_use]
    pub fn get_shared(&self, key: &str) -> Option<SharedValue> {
        self.entries.get(key).cloned()
    }

    /// Returns the entry for `key` as `Arc<T>`.
    ///
    /// Returns `None` if the key is absent or holds another type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        self.get_shared(key)
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Returns the entry for `key` as `Arc<T>`, or an error saying why not.
    pub fn require<T: Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>, StateError> {
        let value = self.get_shared(key).ok_or_else(|| StateError::Missing {
            key: key.to_string(),
        })?;
        value.downcast::<T>().map_err(|_| StateError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Returns `true` if an entry is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("AppState").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn test_insert_and_get() {
        let state = AppState::new().with("counter", Arc::new(Counter(3)));
        let counter: Arc<Counter> = state.get("counter").unwrap();
        assert_eq!(*counter, Counter(3));
        assert!(state.contains("counter"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_get_wrong_type_is_none() {
        let state = AppState::new().with("counter", Arc::new(Counter(3)));
        assert!(state.get::<String>("counter").is_none());
    }

    #[test]
    fn test_require_reports_missing_and_mismatch() {
        let state = AppState::new().with("counter", Arc::new(Counter(1)));

        let missing = state.require::<Counter>("storage").unwrap_err();
        assert_eq!(
            missing,
            StateError::Missing {
                key: "storage".into()
            }
        );

        let mismatch = state.require::<String>("counter").unwrap_err();
        assert!(mismatch.to_string().contains("is not a"));
    }

    #[test]
    fn test_insert_replaces() {
        let mut state = AppState::new();
        state.insert("counter", Arc::new(Counter(1)));
        state.insert("counter", Arc::new(Counter(2)));
        assert_eq!(state.require::<Counter>("counter").unwrap().0, 2);
    }

    #[test]
    fn test_shared_entries_are_the_same_allocation() {
        let counter = Arc::new(Counter(5));
        let state = AppState::new().with("counter", Arc::clone(&counter));
        let resolved = state.require::<Counter>("counter").unwrap();
        assert!(Arc::ptr_eq(&counter, &resolved));
    }
}
