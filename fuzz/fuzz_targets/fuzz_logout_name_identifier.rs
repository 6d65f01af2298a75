//! Fuzz target for logout name identifier encoding.
//!
//! Parsing arbitrary claim values must never panic, and any five fields must
//! survive an encode/parse round trip.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_logout_name_identifier -- -max_total_time=600

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xavyo_saml_sp::LogoutNameIdentifier;

#[derive(Arbitrary, Debug)]
struct LogoutInput {
    raw: String,
    name_qualifier: String,
    sp_name_qualifier: String,
    format: String,
    sp_provided_id: String,
    value: String,
}

fuzz_target!(|input: LogoutInput| {
    // Arbitrary claim values: errors are fine, panics are not
    if let Ok(parsed) = LogoutNameIdentifier::parse(&input.raw) {
        let reparsed = LogoutNameIdentifier::parse(&parsed.encode()).unwrap();
        assert_eq!(parsed, reparsed);
    }

    let id = LogoutNameIdentifier {
        name_qualifier: input.name_qualifier,
        sp_name_qualifier: input.sp_name_qualifier,
        format: input.format,
        sp_provided_id: input.sp_provided_id,
        value: input.value,
    };
    let decoded = LogoutNameIdentifier::parse(&id.encode()).unwrap();
    assert_eq!(decoded, id);
});
