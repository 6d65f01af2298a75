//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;
use xavyo_saml_sp::{
    Assertion, AssertionHandler, AuthnStatement, InMemoryReplayStore, NameId, SpOptions,
};

pub const SP_ENTITY_ID: &str = "https://sp.example.com/saml";
pub const IDP_ISSUER: &str = "https://idp.example.com/saml";
pub const PASSWORD_CLASS: &str =
    "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// Fixed reference instant.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn unique_assertion_id() -> String {
    format!("_{}", Uuid::new_v4())
}

/// A well-formed assertion valid for five minutes around `t0`, addressed to
/// the SP entity ID, with a session index.
pub fn valid_assertion() -> Assertion {
    Assertion::builder(unique_assertion_id(), IDP_ISSUER)
        .issue_instant(t0())
        .subject(
            NameId::new("alice@example.com")
                .with_format("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"),
        )
        .not_before(t0() - Duration::minutes(1))
        .not_on_or_after(t0() + Duration::minutes(5))
        .audience_restriction([SP_ENTITY_ID])
        .authn_statement(
            AuthnStatement::new(t0())
                .with_class_ref(PASSWORD_CLASS)
                .with_session_index("_session-1"),
        )
        .build()
}

pub fn handler(options: SpOptions) -> (AssertionHandler, Arc<InMemoryReplayStore>) {
    init_test_logging();
    let store = Arc::new(InMemoryReplayStore::new());
    let handler = AssertionHandler::new(options, store.clone()).unwrap();
    (handler, store)
}

pub fn default_handler() -> (AssertionHandler, Arc<InMemoryReplayStore>) {
    handler(SpOptions::new(SP_ENTITY_ID))
}
