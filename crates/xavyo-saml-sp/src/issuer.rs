//! Issuer name resolution.
//!
//! Whether the issuer is trusted at all is decided before the assertion
//! reaches this crate (signature and metadata matching). Resolvers here only
//! pick the name that derived claims are tagged with.

use crate::assertion::Assertion;
use std::collections::HashMap;
use thiserror::Error;

/// Canonical issuer name attached to every derived claim.
pub type IssuerName = String;

/// Issuer resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuerError {
    /// The issuer is not in the resolver's trusted list.
    #[error("Untrusted issuer: {0}")]
    UntrustedIssuer(String),
}

/// Maps an assertion's raw issuer to a canonical issuer name.
pub trait IssuerResolver: Send + Sync {
    fn resolve(&self, assertion: &Assertion) -> Result<IssuerName, IssuerError>;
}

/// Returns the issuer embedded in the assertion, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestedIssuerResolver;

impl IssuerResolver for RequestedIssuerResolver {
    fn resolve(&self, assertion: &Assertion) -> Result<IssuerName, IssuerError> {
        Ok(assertion.issuer.clone())
    }
}

/// Resolves issuers against an allow-list, optionally renaming them.
#[derive(Debug, Clone, Default)]
pub struct TrustedIssuerResolver {
    names: HashMap<String, IssuerName>,
}

impl TrustedIssuerResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `issuer` and keep its name as-is.
    #[must_use]
    pub fn trust(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.names.insert(issuer.clone(), issuer);
        self
    }

    /// Trust `issuer` and tag its claims with `name`.
    #[must_use]
    pub fn trust_as(mut self, issuer: impl Into<String>, name: impl Into<IssuerName>) -> Self {
        self.names.insert(issuer.into(), name.into());
        self
    }

    #[must_use]
    pub fn is_trusted(&self, issuer: &str) -> bool {
        self.names.contains_key(issuer)
    }
}

impl IssuerResolver for TrustedIssuerResolver {
    fn resolve(&self, assertion: &Assertion) -> Result<IssuerName, IssuerError> {
        self.names.get(&assertion.issuer).cloned().ok_or_else(|| {
            tracing::warn!(issuer = %assertion.issuer, "Rejected assertion from untrusted issuer");
            IssuerError::UntrustedIssuer(assertion.issuer.clone())
        })
    }
}
