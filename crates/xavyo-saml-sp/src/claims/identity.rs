//! Claims identity produced from a validated assertion.

use super::logout::{LogoutNameIdentifier, LogoutNameIdentifierError};
use crate::assertion::Assertion;
use crate::config::SpOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Claim type URIs.
///
/// `SESSION_INDEX` and `LOGOUT_NAME_IDENTIFIER` are read back by single
/// logout handling and must not change.
pub mod claim_types {
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
    pub const AUTHENTICATION_INSTANT: &str =
        "http://schemas.microsoft.com/ws/2008/06/identity/claims/authenticationinstant";
    pub const AUTHENTICATION_METHOD: &str =
        "http://schemas.microsoft.com/ws/2008/06/identity/claims/authenticationmethod";
    pub const SESSION_INDEX: &str = "http://xavyo.io/saml2/claims/sessionindex";
    pub const LOGOUT_NAME_IDENTIFIER: &str = "http://xavyo.io/saml2/claims/logoutnameidentifier";
}

/// Claim value type URIs.
pub mod value_types {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// Claim property keys.
pub mod claim_properties {
    pub const NAME_ID_FORMAT: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/format";
    pub const NAME_QUALIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/namequalifier";
    pub const SP_NAME_QUALIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/spnamequalifier";
    pub const SP_PROVIDED_ID: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/spprovidedid";
    pub const ATTRIBUTE_NAME_FORMAT: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/attributenameformat";
    pub const ATTRIBUTE_DISPLAY_NAME: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claimproperties/displayname";
}

/// A single claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
    pub value_type: String,
    /// Canonical issuer name.
    pub issuer: String,
    /// Issuer as it appeared in the assertion.
    pub original_issuer: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Claim {
    /// A string-valued claim whose original issuer equals its issuer.
    pub fn new(
        claim_type: impl Into<String>,
        value: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        let issuer = issuer.into();
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: value_types::STRING.to_string(),
            original_issuer: issuer.clone(),
            issuer,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = value_type.into();
        self
    }

    #[must_use]
    pub fn with_original_issuer(mut self, original_issuer: impl Into<String>) -> Self {
        self.original_issuer = original_issuer.into();
        self
    }

    /// Set a property; `None` values are skipped.
    #[must_use]
    pub fn with_property(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(v) = value {
            self.properties.insert(key.to_string(), v.to_string());
        }
        self
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// The validated assertion and the options it was validated under, kept on
/// the identity for later re-inspection (single logout, re-validation).
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    pub assertion: Arc<Assertion>,
    pub options: Arc<SpOptions>,
}

/// An authenticated subject as an ordered list of claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    claims: Vec<Claim>,
    #[serde(skip)]
    bootstrap_context: Option<BootstrapContext>,
}

impl ClaimsIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    #[must_use]
    pub fn into_claims(self) -> Vec<Claim> {
        self.claims
    }

    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }

    pub fn find_all<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a Claim> + 'a {
        self.claims.iter().filter(move |c| c.claim_type == claim_type)
    }

    #[must_use]
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.find_all(claim_type).any(|c| c.value == value)
    }

    #[must_use]
    pub fn name_identifier(&self) -> Option<&Claim> {
        self.find_first(claim_types::NAME_IDENTIFIER)
    }

    #[must_use]
    pub fn session_index(&self) -> Option<&str> {
        self.find_first(claim_types::SESSION_INDEX)
            .map(|c| c.value.as_str())
    }

    /// Parse the logout name identifier claim, if present.
    pub fn logout_name_identifier(
        &self,
    ) -> Option<Result<LogoutNameIdentifier, LogoutNameIdentifierError>> {
        self.find_first(claim_types::LOGOUT_NAME_IDENTIFIER)
            .map(|c| LogoutNameIdentifier::parse(&c.value))
    }

    #[must_use]
    pub fn bootstrap_context(&self) -> Option<&BootstrapContext> {
        self.bootstrap_context.as_ref()
    }

    pub fn set_bootstrap_context(&mut self, context: BootstrapContext) {
        self.bootstrap_context = Some(context);
    }
}
