//! Replay guard: derives the replay expiry from the assertion and records it.

use super::store::ReplayStore;
use super::types::ReplayError;
use crate::assertion::Assertion;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Rejects re-submission of an assertion until it expires.
#[derive(Clone)]
pub struct ReplayGuard {
    store: Arc<dyn ReplayStore>,
    fallback_ttl: Duration,
}

impl std::fmt::Debug for ReplayGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayGuard")
            .field("fallback_ttl", &self.fallback_ttl)
            .finish_non_exhaustive()
    }
}

impl ReplayGuard {
    /// Create a guard over `store`.
    ///
    /// `fallback_ttl` bounds how long an ID is remembered when the assertion
    /// has no `NotOnOrAfter`.
    pub fn new(store: Arc<dyn ReplayStore>, fallback_ttl: Duration) -> Self {
        Self {
            store,
            fallback_ttl,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ReplayStore> {
        &self.store
    }

    /// The instant until which this assertion's ID must be remembered.
    ///
    /// Always the assertion's own `NotOnOrAfter`, read from the assertion
    /// itself. `NotBefore` plays no part in it. Without `NotOnOrAfter` the
    /// fallback TTL applies, saturating at the latest representable instant.
    #[must_use]
    pub fn replay_expiry(&self, assertion: &Assertion, now: DateTime<Utc>) -> DateTime<Utc> {
        assertion.conditions.not_on_or_after.unwrap_or_else(|| {
            now.checked_add_signed(self.fallback_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    /// Check the assertion against previously seen IDs and record it.
    ///
    /// # Errors
    ///
    /// - `ReplayError::MissingAssertionId` if the assertion ID is empty
    /// - `ReplayError::Replayed` if the ID was seen and has not expired
    /// - `ReplayError::StorageError` if the store fails
    pub fn check_and_record(
        &self,
        assertion: &Assertion,
        now: DateTime<Utc>,
    ) -> Result<(), ReplayError> {
        let expires_at = self.replay_expiry(assertion, now);
        self.check_and_record_id(&assertion.id, expires_at, now)
    }

    /// Check and record a bare assertion ID with an explicit expiry.
    pub fn check_and_record_id(
        &self,
        assertion_id: &str,
        not_on_or_after: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), ReplayError> {
        if assertion_id.is_empty() {
            return Err(ReplayError::MissingAssertionId);
        }
        self.store
            .check_and_insert(assertion_id, not_on_or_after, now)
    }
}
