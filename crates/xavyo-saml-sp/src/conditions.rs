//! Validation of `<saml:Conditions>`: validity window and audience.

use crate::assertion::{Assertion, AudienceRestriction};
use crate::audience::AudiencePolicy;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Conditions check failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionsError {
    /// `now` is past `NotOnOrAfter`.
    #[error("Assertion expired at {not_on_or_after} (now {now})")]
    Expired {
        not_on_or_after: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// `now` is before `NotBefore`.
    #[error("Assertion not valid before {not_before} (now {now})")]
    NotYetValid {
        not_before: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// The assertion is not addressed to this SP.
    #[error("Audience mismatch: assertion declares {declared:?}, allowed {allowed:?}")]
    AudienceMismatch {
        declared: Vec<String>,
        allowed: Vec<String>,
    },
}

/// The assertion's validity window as declared in its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub not_before: Option<DateTime<Utc>>,
    pub not_on_or_after: Option<DateTime<Utc>>,
}

/// Outcome of evaluating one declared `<AudienceRestriction>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionOutcome {
    pub restriction: AudienceRestriction,
    pub passed: bool,
}

/// Result of a successful conditions check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionsResult {
    pub window: ValidityWindow,
    /// The restriction this SP applies: the policy's audiences, replacing
    /// whatever the assertion declared. `None` when the policy is disabled.
    pub audience_restriction: Option<AudienceRestriction>,
    /// Per-restriction outcome for what the assertion itself declared.
    pub declared_restrictions: Vec<RestrictionOutcome>,
}

/// Checks an assertion's conditions against the audience policy and a
/// caller-supplied instant.
#[derive(Debug, Clone)]
pub struct ConditionsValidator {
    policy: AudiencePolicy,
    clock_skew: Duration,
}

impl ConditionsValidator {
    #[must_use]
    pub fn new(policy: AudiencePolicy) -> Self {
        Self {
            policy,
            clock_skew: Duration::zero(),
        }
    }

    /// Allow `skew` of clock drift on both ends of the validity window.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew.max(Duration::zero());
        self
    }

    #[must_use]
    pub fn policy(&self) -> &AudiencePolicy {
        &self.policy
    }

    /// Validate the assertion's conditions at `now`.
    ///
    /// Time bounds are checked first, then audience. When the policy is
    /// enforced, every restriction the assertion declares must name at least
    /// one allowed audience, and an assertion that declares none is rejected.
    ///
    /// # Errors
    ///
    /// - `ConditionsError::Expired` if `now > NotOnOrAfter` (plus skew)
    /// - `ConditionsError::NotYetValid` if `now < NotBefore` (minus skew)
    /// - `ConditionsError::AudienceMismatch` if the audience check fails
    ///
    /// A skew that pushes a bound past the representable range leaves that
    /// side of the window open.
    pub fn validate(
        &self,
        assertion: &Assertion,
        now: DateTime<Utc>,
    ) -> Result<ConditionsResult, ConditionsError> {
        let conditions = &assertion.conditions;
        let window = ValidityWindow {
            not_before: conditions.not_before,
            not_on_or_after: conditions.not_on_or_after,
        };

        if let Some(not_on_or_after) = window.not_on_or_after {
            let deadline = not_on_or_after.checked_add_signed(self.clock_skew);
            if deadline.is_some_and(|deadline| now > deadline) {
                return Err(ConditionsError::Expired {
                    not_on_or_after,
                    now,
                });
            }
        }

        if let Some(not_before) = window.not_before {
            let earliest = not_before.checked_sub_signed(self.clock_skew);
            if earliest.is_some_and(|earliest| now < earliest) {
                return Err(ConditionsError::NotYetValid { not_before, now });
            }
        }

        let declared_restrictions: Vec<RestrictionOutcome> = conditions
            .audience_restrictions
            .iter()
            .map(|r| RestrictionOutcome {
                passed: r.audiences.iter().any(|a| self.policy.allows(a)),
                restriction: r.clone(),
            })
            .collect();

        if self.policy.is_enforced() {
            let satisfied = !declared_restrictions.is_empty()
                && declared_restrictions.iter().all(|o| o.passed);
            if !satisfied {
                return Err(ConditionsError::AudienceMismatch {
                    declared: assertion.declared_audiences().map(String::from).collect(),
                    allowed: self.policy.allowed().to_vec(),
                });
            }
        }

        let audience_restriction = self
            .policy
            .is_enforced()
            .then(|| AudienceRestriction::new(self.policy.allowed().iter().cloned()));

        Ok(ConditionsResult {
            window,
            audience_restriction,
            declared_restrictions,
        })
    }
}
