//! Service provider options consumed by the validation pipeline.

use crate::error::ConfigurationError;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Default TTL for replay records of assertions without `NotOnOrAfter` (5 minutes).
pub const DEFAULT_REPLAY_FALLBACK_TTL_SECONDS: i64 = 300;

/// Whether audience restrictions are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceMode {
    /// Audience is checked somewhere else (or deliberately not at all).
    Disabled,
    /// Assertions must be addressed to one of the allowed audiences.
    #[default]
    Enforced,
}

impl std::str::FromStr for AudienceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "never" => Ok(AudienceMode::Disabled),
            "enforced" | "always" => Ok(AudienceMode::Enforced),
            other => Err(format!("unknown audience mode: {other}")),
        }
    }
}

/// Service provider options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpOptions {
    /// This SP's entity ID. Used as the default audience.
    pub entity_id: String,

    #[serde(default)]
    pub audience_mode: AudienceMode,

    /// Explicit audiences; when empty and enforced, `entity_id` is used.
    #[serde(default)]
    pub allowed_audience_uris: Vec<String>,

    /// Keep the validated assertion on the resulting identity.
    #[serde(default)]
    pub save_bootstrap_context: bool,

    /// Do not emit (or require) the authentication method claim.
    #[serde(default)]
    pub ignore_authentication_context_in_response: bool,

    /// Tolerance applied to both ends of the validity window.
    #[serde(default)]
    pub max_clock_skew_seconds: i64,

    /// How long to remember an assertion ID that has no `NotOnOrAfter`.
    #[serde(default = "default_replay_fallback_ttl")]
    pub replay_fallback_ttl_seconds: i64,
}

fn default_replay_fallback_ttl() -> i64 {
    DEFAULT_REPLAY_FALLBACK_TTL_SECONDS
}

impl SpOptions {
    /// Options with defaults for everything except the entity ID.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            audience_mode: AudienceMode::Enforced,
            allowed_audience_uris: Vec::new(),
            save_bootstrap_context: false,
            ignore_authentication_context_in_response: false,
            max_clock_skew_seconds: 0,
            replay_fallback_ttl_seconds: DEFAULT_REPLAY_FALLBACK_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_audience_mode(mut self, mode: AudienceMode) -> Self {
        self.audience_mode = mode;
        self
    }

    #[must_use]
    pub fn with_allowed_audiences(mut self, uris: Vec<impl Into<String>>) -> Self {
        self.allowed_audience_uris = uris.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_save_bootstrap_context(mut self, save: bool) -> Self {
        self.save_bootstrap_context = save;
        self
    }

    #[must_use]
    pub fn with_ignore_authentication_context(mut self, ignore: bool) -> Self {
        self.ignore_authentication_context_in_response = ignore;
        self
    }

    #[must_use]
    pub fn with_clock_skew_seconds(mut self, seconds: i64) -> Self {
        self.max_clock_skew_seconds = seconds;
        self
    }

    /// Negative values count as zero; values past the `Duration` range
    /// saturate. [`validate`](Self::validate) rejects the latter.
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        saturating_seconds(self.max_clock_skew_seconds)
    }

    #[must_use]
    pub fn replay_fallback_ttl(&self) -> Duration {
        saturating_seconds(self.replay_fallback_ttl_seconds)
    }

    /// Check that the configured durations are representable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DurationOutOfRange` for a skew or TTL
    /// that does not fit in a `Duration`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, seconds) in [
            ("max_clock_skew_seconds", self.max_clock_skew_seconds),
            ("replay_fallback_ttl_seconds", self.replay_fallback_ttl_seconds),
        ] {
            if Duration::try_seconds(seconds.max(0)).is_none() {
                return Err(ConfigurationError::DurationOutOfRange {
                    field: field.to_string(),
                    seconds,
                });
            }
        }
        Ok(())
    }

    /// Load options from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load options from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let entity_id = reader("SAML_SP_ENTITY_ID")
            .map_err(|_| ConfigError::MissingVar("SAML_SP_ENTITY_ID".into()))?;

        let audience_mode = reader("SAML_SP_AUDIENCE_MODE")
            .unwrap_or_else(|_| "enforced".to_string())
            .parse::<AudienceMode>()
            .map_err(|e| ConfigError::InvalidValue("SAML_SP_AUDIENCE_MODE".into(), e))?;

        let allowed_audience_uris = reader("SAML_SP_ALLOWED_AUDIENCE_URIS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let save_bootstrap_context = parse_bool(&reader, "SAML_SP_SAVE_BOOTSTRAP_CONTEXT", false)?;
        let ignore_authentication_context_in_response =
            parse_bool(&reader, "SAML_SP_IGNORE_AUTHN_CONTEXT", false)?;

        let max_clock_skew_seconds = parse_seconds(&reader, "SAML_SP_CLOCK_SKEW_SECONDS", 0)?;
        let replay_fallback_ttl_seconds = parse_seconds(
            &reader,
            "SAML_SP_REPLAY_FALLBACK_TTL_SECONDS",
            DEFAULT_REPLAY_FALLBACK_TTL_SECONDS,
        )?;

        Ok(Self {
            entity_id,
            audience_mode,
            allowed_audience_uris,
            save_bootstrap_context,
            ignore_authentication_context_in_response,
            max_clock_skew_seconds,
            replay_fallback_ttl_seconds,
        })
    }
}

fn saturating_seconds(seconds: i64) -> Duration {
    Duration::try_seconds(seconds.max(0)).unwrap_or_else(Duration::max_value)
}

/// Parse a non-negative number of seconds that fits in a `Duration`.
fn parse_seconds<F>(reader: &F, key: &str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Ok(raw) = reader(key) else {
        return Ok(default);
    };
    let seconds = raw
        .trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string()))?;
    if seconds < 0 || Duration::try_seconds(seconds).is_none() {
        return Err(ConfigError::InvalidValue(
            key.into(),
            format!("{seconds} seconds is out of range"),
        ));
    }
    Ok(seconds)
}

fn parse_bool<F>(reader: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match reader(key) {
        Ok(v) => v
            .trim()
            .parse::<bool>()
            .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
