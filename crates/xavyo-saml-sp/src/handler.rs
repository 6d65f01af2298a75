//! Assertion ingestion facade.
//!
//! Runs an already-verified assertion through conditions, replay, issuer
//! resolution and claims construction, in that order, stopping at the first
//! failure.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::assertion::Assertion;
use crate::audience::AudiencePolicy;
use crate::claims::{ClaimsBuilder, ClaimsIdentity};
use crate::conditions::ConditionsValidator;
use crate::config::SpOptions;
use crate::error::{SamlSpError, SamlSpResult};
use crate::issuer::{IssuerResolver, RequestedIssuerResolver};
use crate::replay::{ReplayGuard, ReplayStore};

/// Pipeline stage an assertion was rejected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    /// Before any check ran (unusable configuration).
    Received,
    Conditions,
    Replay,
    Issuer,
    Claims,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationStage::Received => "received",
            ValidationStage::Conditions => "conditions",
            ValidationStage::Replay => "replay",
            ValidationStage::Issuer => "issuer",
            ValidationStage::Claims => "claims",
        };
        f.write_str(s)
    }
}

/// Progress of a single assertion through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    Received,
    ConditionsChecked,
    ReplayChecked,
    IssuerResolved,
    ClaimsBuilt,
    Rejected(ValidationStage),
}

impl ValidationState {
    /// The stage that runs from this state, if any.
    #[must_use]
    pub fn next_stage(self) -> Option<ValidationStage> {
        match self {
            ValidationState::Received => Some(ValidationStage::Conditions),
            ValidationState::ConditionsChecked => Some(ValidationStage::Replay),
            ValidationState::ReplayChecked => Some(ValidationStage::Issuer),
            ValidationState::IssuerResolved => Some(ValidationStage::Claims),
            ValidationState::ClaimsBuilt | ValidationState::Rejected(_) => None,
        }
    }

    /// State after the current stage succeeds.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            ValidationState::Received => ValidationState::ConditionsChecked,
            ValidationState::ConditionsChecked => ValidationState::ReplayChecked,
            ValidationState::ReplayChecked => ValidationState::IssuerResolved,
            ValidationState::IssuerResolved => ValidationState::ClaimsBuilt,
            terminal => terminal,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ValidationState::ClaimsBuilt | ValidationState::Rejected(_)
        )
    }
}

/// Validates assertions and turns them into claims identities.
///
/// Cheap to share across threads: the replay store is the only mutable state
/// and it handles its own synchronization.
#[derive(Clone)]
pub struct AssertionHandler {
    options: Arc<SpOptions>,
    conditions: ConditionsValidator,
    replay: ReplayGuard,
    issuer_resolver: Arc<dyn IssuerResolver>,
    claims: ClaimsBuilder,
}

impl fmt::Debug for AssertionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionHandler")
            .field("options", &self.options)
            .field("conditions", &self.conditions)
            .field("replay", &self.replay)
            .finish_non_exhaustive()
    }
}

impl AssertionHandler {
    /// Create a handler with the default issuer resolver.
    ///
    /// The audience policy is resolved once here and reused for every
    /// assertion.
    ///
    /// # Errors
    ///
    /// Returns `SamlSpError::Configuration` if the audience policy cannot be
    /// resolved from `options` or a configured duration is out of range.
    pub fn new(options: SpOptions, store: Arc<dyn ReplayStore>) -> SamlSpResult<Self> {
        options.validate()?;
        let policy = AudiencePolicy::from_options(&options)?;
        let options = Arc::new(options);

        Ok(Self {
            conditions: ConditionsValidator::new(policy).with_clock_skew(options.clock_skew()),
            replay: ReplayGuard::new(store, options.replay_fallback_ttl()),
            issuer_resolver: Arc::new(RequestedIssuerResolver),
            claims: ClaimsBuilder::new(Arc::clone(&options)),
            options,
        })
    }

    /// Replace the issuer resolver.
    #[must_use]
    pub fn with_issuer_resolver(mut self, resolver: Arc<dyn IssuerResolver>) -> Self {
        self.issuer_resolver = resolver;
        self
    }

    #[must_use]
    pub fn options(&self) -> &SpOptions {
        &self.options
    }

    #[must_use]
    pub fn audience_policy(&self) -> &AudiencePolicy {
        self.conditions.policy()
    }

    #[must_use]
    pub fn replay_guard(&self) -> &ReplayGuard {
        &self.replay
    }

    /// Validate an assertion at `now` and build its claims identity.
    ///
    /// The assertion's signature must already have been verified. The error
    /// reports the stage that rejected it through [`SamlSpError::stage`].
    ///
    /// # Errors
    ///
    /// Returns the first stage's error: `Conditions`, `Replay`, `Issuer` or
    /// `Claims`.
    #[instrument(skip(self, assertion), fields(assertion_id = %assertion.id, issuer = %assertion.issuer))]
    pub fn validate(
        &self,
        assertion: &Assertion,
        now: DateTime<Utc>,
    ) -> SamlSpResult<ClaimsIdentity> {
        let mut state = ValidationState::Received;
        match self.run(assertion, now, &mut state) {
            Ok(identity) => {
                info!(claims = identity.claims().len(), "Assertion accepted");
                Ok(identity)
            }
            Err(e) => {
                let rejected = ValidationState::from(&e);
                warn!(reached = ?state, state = ?rejected, error = %e, "Assertion rejected");
                Err(e)
            }
        }
    }

    fn run(
        &self,
        assertion: &Assertion,
        now: DateTime<Utc>,
        state: &mut ValidationState,
    ) -> SamlSpResult<ClaimsIdentity> {
        self.conditions.validate(assertion, now)?;
        transition(state);

        self.replay.check_and_record(assertion, now)?;
        transition(state);

        let issuer = self.issuer_resolver.resolve(assertion)?;
        transition(state);

        let identity = self.claims.build(assertion, &issuer)?;
        transition(state);

        Ok(identity)
    }
}

fn transition(state: &mut ValidationState) {
    let from = *state;
    *state = from.advance();
    debug!(?from, to = ?state, "Validation state transition");
}

impl From<&SamlSpError> for ValidationState {
    fn from(err: &SamlSpError) -> Self {
        ValidationState::Rejected(err.stage())
    }
}
