//! Claims construction for validated assertions.

use std::sync::Arc;

use tracing::debug;

use super::identity::{claim_properties, claim_types, BootstrapContext, Claim, ClaimsIdentity};
use super::logout::LogoutNameIdentifier;
use super::statement;
use super::ClaimsBuildError;
use crate::assertion::{Assertion, NameId};
use crate::config::SpOptions;

/// Builds the claims identity for an assertion that passed every check.
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    options: Arc<SpOptions>,
}

impl ClaimsBuilder {
    pub fn new(options: Arc<SpOptions>) -> Self {
        Self { options }
    }

    /// Build the identity.
    ///
    /// Declaration references are cleared on a working copy before generic
    /// conversion, so they never fail this path. The bootstrap context keeps
    /// the assertion as received.
    pub fn build(
        &self,
        assertion: &Assertion,
        issuer: &str,
    ) -> Result<ClaimsIdentity, ClaimsBuildError> {
        let mut working = assertion.clone();
        for statement in &mut working.authn_statements {
            statement.authn_context.decl_ref = None;
        }

        let mut identity = statement::convert(
            &working,
            issuer,
            self.options.ignore_authentication_context_in_response,
        )?;

        let logout = logout_name_identifier(&identity).map(|id| id.encode());
        for session_index in working
            .authn_statements
            .iter()
            .filter_map(|s| s.non_empty_session_index())
        {
            identity.add_claim(
                Claim::new(claim_types::SESSION_INDEX, session_index, issuer)
                    .with_original_issuer(assertion.issuer.as_str()),
            );
            if let Some(logout) = &logout {
                identity.add_claim(
                    Claim::new(
                        claim_types::LOGOUT_NAME_IDENTIFIER,
                        logout.as_str(),
                        issuer,
                    )
                    .with_original_issuer(assertion.issuer.as_str()),
                );
            }
        }

        if self.options.save_bootstrap_context {
            identity.set_bootstrap_context(BootstrapContext {
                assertion: Arc::new(assertion.clone()),
                options: Arc::clone(&self.options),
            });
        }

        debug!(
            assertion_id = %assertion.id,
            claims = identity.claims().len(),
            "Built claims identity"
        );

        Ok(identity)
    }
}

/// Rebuild the subject `NameID` from the name identifier claim.
fn logout_name_identifier(identity: &ClaimsIdentity) -> Option<LogoutNameIdentifier> {
    let claim = identity.name_identifier()?;
    let owned = |key: &str| claim.property(key).map(str::to_string);
    let name_id = NameId {
        value: claim.value.clone(),
        name_qualifier: owned(claim_properties::NAME_QUALIFIER),
        sp_name_qualifier: owned(claim_properties::SP_NAME_QUALIFIER),
        format: owned(claim_properties::NAME_ID_FORMAT),
        sp_provided_id: owned(claim_properties::SP_PROVIDED_ID),
    };
    Some(LogoutNameIdentifier::from_name_id(&name_id))
}
