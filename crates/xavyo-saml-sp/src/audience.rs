//! Audience policy derived from SP configuration.

use crate::config::{AudienceMode, SpOptions};
use crate::error::ConfigurationError;

/// The set of audiences an assertion must be addressed to.
///
/// Resolved once when the handler is built and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudiencePolicy {
    mode: AudienceMode,
    allowed: Vec<String>,
}

impl AudiencePolicy {
    /// Resolve the effective policy.
    ///
    /// With `Enforced` and no configured URIs the SP's own entity ID becomes
    /// the only allowed audience. Explicit URIs replace that default entirely.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::MissingEntityId` if the entity ID fallback is
    ///   needed but the entity ID is blank
    /// - `ConfigurationError::InvalidAudienceUri` if a configured URI is blank
    pub fn resolve(
        entity_id: &str,
        mode: AudienceMode,
        configured_uris: &[String],
    ) -> Result<Self, ConfigurationError> {
        if mode == AudienceMode::Disabled {
            return Ok(Self::disabled());
        }

        if let Some(blank) = configured_uris.iter().find(|u| u.trim().is_empty()) {
            return Err(ConfigurationError::InvalidAudienceUri(blank.clone()));
        }

        let allowed = if configured_uris.is_empty() {
            let entity_id = entity_id.trim();
            if entity_id.is_empty() {
                return Err(ConfigurationError::MissingEntityId);
            }
            vec![entity_id.to_string()]
        } else {
            let mut uris = Vec::with_capacity(configured_uris.len());
            for uri in configured_uris {
                if !uris.contains(uri) {
                    uris.push(uri.clone());
                }
            }
            uris
        };

        Ok(Self {
            mode: AudienceMode::Enforced,
            allowed,
        })
    }

    /// Resolve the policy from SP options.
    pub fn from_options(options: &SpOptions) -> Result<Self, ConfigurationError> {
        Self::resolve(
            &options.entity_id,
            options.audience_mode,
            &options.allowed_audience_uris,
        )
    }

    /// A policy that accepts any audience.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            mode: AudienceMode::Disabled,
            allowed: Vec::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> AudienceMode {
        self.mode
    }

    #[must_use]
    pub fn is_enforced(&self) -> bool {
        self.mode == AudienceMode::Enforced
    }

    /// The effective allowed audiences. Empty when disabled.
    #[must_use]
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Whether `audience` is one of the allowed audiences.
    #[must_use]
    pub fn allows(&self, audience: &str) -> bool {
        !self.is_enforced() || self.allowed.iter().any(|a| a == audience)
    }
}
