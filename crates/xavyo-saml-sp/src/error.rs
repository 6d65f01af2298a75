//! Error types for assertion validation.
//!
//! Each pipeline component has its own error enum; [`SamlSpError`] wraps them
//! so callers can tell which stage rejected an assertion.

use crate::claims::ClaimsBuildError;
use crate::conditions::ConditionsError;
use crate::handler::ValidationStage;
use crate::issuer::IssuerError;
use crate::replay::ReplayError;
use thiserror::Error;

/// Result type for assertion validation.
pub type SamlSpResult<T> = Result<T, SamlSpError>;

/// Service provider configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Audience enforcement needs the SP entity ID as its default audience,
    /// but none was configured.
    #[error("SP entity ID is required when audience restriction is enforced without explicit audiences")]
    MissingEntityId,

    /// A configured audience URI is blank.
    #[error("Invalid audience URI: {0:?}")]
    InvalidAudienceUri(String),

    /// A configured duration does not fit in the supported time range.
    #[error("{field} is out of range: {seconds} seconds")]
    DurationOutOfRange { field: String, seconds: i64 },
}

/// Assertion validation errors, tagged by the stage that failed.
#[derive(Debug, Error)]
pub enum SamlSpError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Conditions check failed: {0}")]
    Conditions(#[from] ConditionsError),

    #[error("Replay check failed: {0}")]
    Replay(#[from] ReplayError),

    #[error("Issuer resolution failed: {0}")]
    Issuer(#[from] IssuerError),

    #[error("Claims generation failed: {0}")]
    Claims(#[from] ClaimsBuildError),
}

impl SamlSpError {
    /// The pipeline stage that rejected the assertion.
    #[must_use]
    pub fn stage(&self) -> ValidationStage {
        match self {
            SamlSpError::Configuration(_) => ValidationStage::Received,
            SamlSpError::Conditions(_) => ValidationStage::Conditions,
            SamlSpError::Replay(_) => ValidationStage::Replay,
            SamlSpError::Issuer(_) => ValidationStage::Issuer,
            SamlSpError::Claims(_) => ValidationStage::Claims,
        }
    }

    /// Check if this error indicates a replayed assertion.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, SamlSpError::Replay(ReplayError::Replayed { .. }))
    }

    /// Check if this error indicates an expired assertion.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, SamlSpError::Conditions(ConditionsError::Expired { .. }))
    }

    /// Check if this error indicates an assertion that is not yet valid.
    #[must_use]
    pub fn is_not_yet_valid(&self) -> bool {
        matches!(
            self,
            SamlSpError::Conditions(ConditionsError::NotYetValid { .. })
        )
    }

    /// Check if this error indicates the assertion was addressed elsewhere.
    #[must_use]
    pub fn is_audience_mismatch(&self) -> bool {
        matches!(
            self,
            SamlSpError::Conditions(ConditionsError::AudienceMismatch { .. })
        )
    }
}
