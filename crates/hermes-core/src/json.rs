//! JSON encoding conventions.
//!
//! Hermes services encode date/time values as integer Unix epoch seconds and
//! unique identifiers as their hyphenated string form. Identifiers need no
//! help (`uuid` serializes that way with its `serde` feature); timestamps use
//! the [`epoch_seconds`] adapter or the [`EpochSeconds`] newtype.
//!
//! ```
//! use chrono::{DateTime, TimeZone, Utc};
//! use serde::Serialize;
//! use uuid::Uuid;
//!
//! #[derive(Serialize)]
//! struct Event {
//!     id: Uuid,
//!     #[serde(with = "hermes_core::json::epoch_seconds")]
//!     at: DateTime<Utc>,
//! }
//!
//! let event = Event {
//!     id: Uuid::nil(),
//!     at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
//! };
//! assert_eq!(
//!     hermes_core::json::to_string(&event).unwrap(),
//!     r#"{"id":"00000000-0000-0000-0000-000000000000","at":1609459200}"#
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Encodes a value as compact JSON text.
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Decodes JSON text into a [`Value`].
///
/// Empty input is an error, like any other malformed document.
pub fn from_slice(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Serde adapter encoding `DateTime<Utc>` as integer epoch seconds.
pub mod epoch_seconds {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc};

    /// Serializes the timestamp as whole seconds since the Unix epoch.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.timestamp())
    }

    /// Deserializes whole seconds since the Unix epoch.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {seconds}")))
    }
}

/// A timestamp that serializes as integer epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochSeconds(pub DateTime<Utc>);

impl EpochSeconds {
    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl From<DateTime<Utc>> for EpochSeconds {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for EpochSeconds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        epoch_seconds::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for EpochSeconds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        epoch_seconds::deserialize(deserializer).map(Self)
    }
}
