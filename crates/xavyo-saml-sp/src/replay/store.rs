//! Replay record storage.
//!
//! The in-memory store is process-wide and safe to share between threads.
//! Other backends (shared cache, database) implement [`ReplayStore`] with the
//! same atomicity guarantee.

use super::types::{ReplayError, ReplayRecord};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Storage for seen assertion IDs.
pub trait ReplayStore: Send + Sync {
    /// Atomically check and record an assertion ID.
    ///
    /// Fails with `ReplayError::Replayed` if the ID is already recorded and
    /// `now` is not past its expiry. Otherwise records
    /// `(assertion_id, expires_at)`, replacing any expired record.
    fn check_and_insert(
        &self,
        assertion_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), ReplayError>;

    /// Look up a record by assertion ID.
    fn get(&self, assertion_id: &str) -> Result<Option<ReplayRecord>, ReplayError>;

    /// Remove records whose expiry is before `now`.
    ///
    /// Returns the number of records deleted
    fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, ReplayError>;
}

/// In-memory replay store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReplayStore {
    records: Arc<DashMap<String, ReplayRecord>>,
}

impl InMemoryReplayStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn check_and_insert(
        &self,
        assertion_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), ReplayError> {
        // The entry guard holds the shard lock across check and insert.
        match self.records.entry(assertion_id.to_string()) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_active(now) {
                    let blocked_until = existing.get().expires_at;
                    tracing::warn!(
                        assertion_id = %assertion_id,
                        expires_at = %blocked_until,
                        "Replay attack detected: assertion already used"
                    );
                    return Err(ReplayError::Replayed {
                        assertion_id: assertion_id.to_string(),
                        expires_at: blocked_until,
                    });
                }
                existing.insert(ReplayRecord::new(assertion_id, expires_at, now));
            }
            Entry::Vacant(slot) => {
                slot.insert(ReplayRecord::new(assertion_id, expires_at, now));
            }
        }

        tracing::debug!(
            assertion_id = %assertion_id,
            expires_at = %expires_at,
            "Recorded SAML assertion ID"
        );

        Ok(())
    }

    fn get(&self, assertion_id: &str) -> Result<Option<ReplayRecord>, ReplayError> {
        Ok(self.records.get(assertion_id).map(|r| r.value().clone()))
    }

    fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, ReplayError> {
        let before_count = self.records.len();

        self.records.retain(|_, record| record.is_active(now));

        let deleted = before_count.saturating_sub(self.records.len()) as u64;

        if deleted > 0 {
            tracing::debug!(deleted = deleted, "Cleaned up expired SAML replay records");
        }

        Ok(deleted)
    }
}
