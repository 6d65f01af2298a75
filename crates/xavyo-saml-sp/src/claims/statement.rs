//! Generic conversion of assertion statements into claims.
//!
//! Produces, in order: the subject name identifier, one authentication
//! instant and method per authentication statement, then one claim per
//! attribute value.

use super::identity::{claim_properties, claim_types, value_types, Claim, ClaimsIdentity};
use super::ClaimsBuildError;
use crate::assertion::{Assertion, AuthnStatement};
use chrono::SecondsFormat;

/// Convert an assertion's statements into a fresh identity.
///
/// `lenient_authn_context` skips the authentication method claim.
///
/// # Errors
///
/// - `ClaimsBuildError::UnsupportedDeclarationReference` if an
///   authentication context carries a declaration reference
/// - `ClaimsBuildError::MalformedStatement` if an attribute has no name or
///   no values
pub fn convert(
    assertion: &Assertion,
    issuer: &str,
    lenient_authn_context: bool,
) -> Result<ClaimsIdentity, ClaimsBuildError> {
    let mut identity = ClaimsIdentity::new();
    let original_issuer = assertion.issuer.as_str();

    if let Some(name_id) = &assertion.subject {
        identity.add_claim(
            Claim::new(claim_types::NAME_IDENTIFIER, &name_id.value, issuer)
                .with_original_issuer(original_issuer)
                .with_property(claim_properties::NAME_ID_FORMAT, name_id.format.as_deref())
                .with_property(
                    claim_properties::NAME_QUALIFIER,
                    name_id.name_qualifier.as_deref(),
                )
                .with_property(
                    claim_properties::SP_NAME_QUALIFIER,
                    name_id.sp_name_qualifier.as_deref(),
                )
                .with_property(
                    claim_properties::SP_PROVIDED_ID,
                    name_id.sp_provided_id.as_deref(),
                ),
        );
    }

    for statement in &assertion.authn_statements {
        add_authn_claims(
            &mut identity,
            statement,
            issuer,
            original_issuer,
            lenient_authn_context,
        )?;
    }

    for statement in &assertion.attribute_statements {
        for attribute in &statement.attributes {
            if attribute.name.is_empty() {
                return Err(ClaimsBuildError::MalformedStatement(
                    "attribute without a name".to_string(),
                ));
            }
            if attribute.values.is_empty() {
                return Err(ClaimsBuildError::MalformedStatement(format!(
                    "attribute {} has no values",
                    attribute.name
                )));
            }
            for value in &attribute.values {
                identity.add_claim(
                    Claim::new(&attribute.name, value, issuer)
                        .with_original_issuer(original_issuer)
                        .with_property(
                            claim_properties::ATTRIBUTE_NAME_FORMAT,
                            attribute.name_format.as_deref(),
                        )
                        .with_property(
                            claim_properties::ATTRIBUTE_DISPLAY_NAME,
                            attribute.friendly_name.as_deref(),
                        ),
                );
            }
        }
    }

    Ok(identity)
}

fn add_authn_claims(
    identity: &mut ClaimsIdentity,
    statement: &AuthnStatement,
    issuer: &str,
    original_issuer: &str,
    lenient_authn_context: bool,
) -> Result<(), ClaimsBuildError> {
    if let Some(decl_ref) = &statement.authn_context.decl_ref {
        return Err(ClaimsBuildError::UnsupportedDeclarationReference(
            decl_ref.clone(),
        ));
    }

    identity.add_claim(
        Claim::new(
            claim_types::AUTHENTICATION_INSTANT,
            statement
                .authn_instant
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            issuer,
        )
        .with_value_type(value_types::DATE_TIME)
        .with_original_issuer(original_issuer),
    );

    if !lenient_authn_context {
        if let Some(class_ref) = &statement.authn_context.class_ref {
            identity.add_claim(
                Claim::new(claim_types::AUTHENTICATION_METHOD, class_ref, issuer)
                    .with_original_issuer(original_issuer),
            );
        }
    }

    Ok(())
}
