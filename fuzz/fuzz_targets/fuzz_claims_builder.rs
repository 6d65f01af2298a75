//! Fuzz target for the assertion handler.
//!
//! Feeds assertions with arbitrary identifiers, subjects, attributes and
//! validity windows through the full pipeline. Any outcome is acceptable as
//! long as nothing panics and accepted identities stay consistent.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_claims_builder -- -max_total_time=600

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use chrono::{DateTime, Duration, Utc};
use libfuzzer_sys::fuzz_target;
use xavyo_saml_sp::claims::claim_types;
use xavyo_saml_sp::{
    Assertion, AssertionHandler, Attribute, AuthnStatement, InMemoryReplayStore, NameId,
    SpOptions,
};

const SP: &str = "https://sp.example.com";

#[derive(Arbitrary, Debug)]
struct AssertionInput {
    id: String,
    issuer: String,
    subject: Option<(String, Option<String>, Option<String>)>,
    session_index: Option<String>,
    decl_ref: Option<String>,
    attributes: Vec<(String, Vec<String>)>,
    not_before_offset_secs: Option<i32>,
    not_on_or_after_offset_secs: Option<i32>,
    audience_matches: bool,
    save_bootstrap_context: bool,
}

fuzz_target!(|input: AssertionInput| {
    // Skip very large inputs to avoid memory issues
    if input.attributes.len() > 64 || input.id.len() > 1000 || input.issuer.len() > 1000 {
        return;
    }

    let now = DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000);

    let mut builder = Assertion::builder(&input.id, &input.issuer);
    if let Some((value, qualifier, format)) = &input.subject {
        let mut name_id = NameId::new(value);
        if let Some(q) = qualifier {
            name_id = name_id.with_name_qualifier(q);
        }
        if let Some(f) = format {
            name_id = name_id.with_format(f);
        }
        builder = builder.subject(name_id);
    }
    if let Some(offset) = input.not_before_offset_secs {
        builder = builder.not_before(now + Duration::seconds(i64::from(offset)));
    }
    if let Some(offset) = input.not_on_or_after_offset_secs {
        builder = builder.not_on_or_after(now + Duration::seconds(i64::from(offset)));
    }
    builder = builder.audience_restriction([if input.audience_matches {
        SP
    } else {
        "https://elsewhere.example.com"
    }]);

    let mut statement = AuthnStatement::new(now);
    if let Some(index) = &input.session_index {
        statement = statement.with_session_index(index);
    }
    if let Some(decl) = &input.decl_ref {
        statement = statement.with_decl_ref(decl);
    }
    builder = builder.authn_statement(statement);

    for (name, values) in &input.attributes {
        builder = builder.attribute(Attribute::new(name, values));
    }
    let assertion = builder.build();

    let options = SpOptions::new(SP).with_save_bootstrap_context(input.save_bootstrap_context);
    let Ok(handler) = AssertionHandler::new(options, Arc::new(InMemoryReplayStore::new())) else {
        return;
    };

    if let Ok(identity) = handler.validate(&assertion, now) {
        // Accepted: every claim is tagged with the raw issuer
        for claim in identity.claims() {
            assert_eq!(claim.original_issuer, input.issuer);
        }
        if let Some(result) = identity.logout_name_identifier() {
            let logout = result.unwrap();
            assert_eq!(
                Some(logout.value.as_str()),
                identity.name_identifier().map(|c| c.value.as_str())
            );
        }
        assert!(identity
            .find_all(claim_types::SESSION_INDEX)
            .all(|c| !c.value.is_empty()));
        assert_eq!(
            identity.bootstrap_context().is_some(),
            input.save_bootstrap_context
        );

        // Claims should be serializable
        let _ = serde_json::to_string(&identity);

        // A second submission is always a replay
        assert!(handler.validate(&assertion, now).unwrap_err().is_replay());
    }
});
