//! Replay record and error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A remembered assertion ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// The assertion `ID`.
    pub assertion_id: String,
    /// When the record first blocked reuse.
    pub recorded_at: DateTime<Utc>,
    /// The assertion's `NotOnOrAfter`; reuse is blocked until this instant.
    pub expires_at: DateTime<Utc>,
}

impl ReplayRecord {
    #[must_use]
    pub fn new(
        assertion_id: impl Into<String>,
        expires_at: DateTime<Utc>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            assertion_id: assertion_id.into(),
            recorded_at,
            expires_at,
        }
    }

    /// Whether the record still blocks reuse at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    /// Whether the record can be dropped at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_active(now)
    }
}

/// Replay check errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The assertion ID was already used and its record has not expired.
    #[error("Replay detected: assertion {assertion_id} was already used (blocked until {expires_at})")]
    Replayed {
        assertion_id: String,
        expires_at: DateTime<Utc>,
    },

    /// The assertion has no ID to track.
    #[error("Assertion has no ID")]
    MissingAssertionId,

    /// Storage error
    #[error("Replay store error: {0}")]
    StorageError(String),
}
