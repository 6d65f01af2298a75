//! SAML 2.0 Service Provider assertion processing for xavyo
//!
//! This crate takes an assertion whose signature has already been verified
//! and decides whether to accept it:
//! - Validity window (`NotBefore` / `NotOnOrAfter`) with optional clock skew
//! - Audience restriction, enforced against configured URIs or the SP entity ID
//! - Replay prevention keyed on the assertion ID until its `NotOnOrAfter`
//! - Issuer name resolution through a pluggable strategy
//! - Claims identity construction, including session index and logout
//!   name identifier claims used by single logout
//!
//! Parsing, signature verification and transport bindings live elsewhere.

pub mod assertion;
pub mod audience;
pub mod claims;
pub mod conditions;
pub mod config;
pub mod error;
pub mod handler;
pub mod issuer;
pub mod replay;

pub use assertion::{
    Assertion, AssertionBuilder, Attribute, AttributeStatement, AudienceRestriction,
    AuthnContext, AuthnStatement, Conditions, NameId,
};
pub use audience::AudiencePolicy;
pub use claims::{
    BootstrapContext, Claim, ClaimsBuildError, ClaimsBuilder, ClaimsIdentity,
    LogoutNameIdentifier, LogoutNameIdentifierError,
};
pub use conditions::{ConditionsError, ConditionsResult, ConditionsValidator};
pub use config::{AudienceMode, ConfigError, SpOptions};
pub use error::{ConfigurationError, SamlSpError, SamlSpResult};
pub use handler::{AssertionHandler, ValidationStage, ValidationState};
pub use issuer::{IssuerError, IssuerName, IssuerResolver, RequestedIssuerResolver, TrustedIssuerResolver};
pub use replay::{
    InMemoryReplayStore, ReplayCleanupConfig, ReplayCleanupWorker, ReplayError, ReplayGuard,
    ReplayRecord, ReplayStore,
};
