//! Per-request context.
//!
//! The [`RequestContext`] travels with one request through the dispatcher.
//! It carries the request id used for log correlation and the envelope id
//! that error bodies echo back in envelope mode.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines of consecutive requests
/// sorted.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let a = RequestId::new();
/// let b = RequestId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Mutable state of one request while it is being dispatched.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    handler: Option<String>,
    envelope_id: Option<i64>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for the given request.
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            handler: None,
            envelope_id: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the name of the handler serving the request, once known.
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    /// Returns a context naming the handler serving the request.
    #[must_use]
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Returns the correlation id of the request envelope, if one was read.
    #[must_use]
    pub const fn envelope_id(&self) -> Option<i64> {
        self.envelope_id
    }

    /// Records the correlation id of the request envelope.
    pub fn set_envelope_id(&mut self, id: Option<i64>) {
        self.envelope_id = id;
    }

    /// Returns the time spent on the request so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(RequestId::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_display_is_uuid() {
        let id = RequestId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
        assert_eq!(id.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_request_ids_are_time_ordered() {
        let first = RequestId::new();
        let second = RequestId::new();
        assert!(first.as_uuid() < second.as_uuid());
    }

    #[test]
    fn test_envelope_id_round_trip() {
        let mut ctx = RequestContext::default();
        assert_eq!(ctx.envelope_id(), None);
        ctx.set_envelope_id(Some(-7));
        assert_eq!(ctx.envelope_id(), Some(-7));
    }

    #[test]
    fn test_with_handler() {
        let ctx = RequestContext::default().with_handler("create");
        assert_eq!(ctx.handler(), Some("create"));
    }
}
