//! Validity window and audience enforcement tests

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use xavyo_saml_sp::{
        Assertion, AudienceMode, ConditionsError, ConfigurationError, SamlSpError, SpOptions,
        ValidationStage,
    };

    use crate::common::{default_handler, handler, t0, valid_assertion, IDP_ISSUER, SP_ENTITY_ID};

    // ============================================================
    // Validity Window
    // ============================================================

    #[test]
    fn test_expired_regardless_of_not_before() {
        let (handler, store) = default_handler();
        let now = t0();

        let cases = [
            None,
            Some(now - Duration::hours(1)),
            Some(now + Duration::hours(1)),
        ];

        for not_before in cases {
            let mut assertion = valid_assertion();
            assertion.conditions.not_before = not_before;
            assertion.conditions.not_on_or_after = Some(now - Duration::seconds(1));

            let err = handler.validate(&assertion, now).unwrap_err();
            assert!(err.is_expired(), "not_before {not_before:?} gave {err:?}");
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_not_on_or_after_boundary_accepted() {
        let (handler, _store) = default_handler();
        let boundary = valid_assertion().conditions.not_on_or_after.unwrap();

        assert!(handler.validate(&valid_assertion(), boundary).is_ok());

        let now = boundary + Duration::milliseconds(1);
        let err = handler.validate(&valid_assertion(), now).unwrap_err();
        assert!(matches!(
            err,
            SamlSpError::Conditions(ConditionsError::Expired { not_on_or_after, now })
                if not_on_or_after == boundary && now == boundary + Duration::milliseconds(1)
        ));
    }

    #[test]
    fn test_not_yet_valid() {
        let (handler, _store) = default_handler();
        let assertion = valid_assertion();
        let not_before = assertion.conditions.not_before.unwrap();

        let err = handler
            .validate(&assertion, not_before - Duration::seconds(1))
            .unwrap_err();
        assert!(err.is_not_yet_valid());
        assert_eq!(err.stage(), ValidationStage::Conditions);

        // NotBefore itself is inside the window.
        assert!(handler.validate(&assertion, not_before).is_ok());
    }

    #[test]
    fn test_clock_skew_widens_window() {
        let options = SpOptions::new(SP_ENTITY_ID).with_clock_skew_seconds(60);
        let (handler, _store) = handler(options);

        let early = valid_assertion();
        let not_before = early.conditions.not_before.unwrap();
        assert!(handler
            .validate(&early, not_before - Duration::seconds(30))
            .is_ok());

        let late = valid_assertion();
        let not_on_or_after = late.conditions.not_on_or_after.unwrap();
        assert!(handler
            .validate(&late, not_on_or_after + Duration::seconds(30))
            .is_ok());

        let too_late = valid_assertion();
        assert!(handler
            .validate(&too_late, not_on_or_after + Duration::seconds(61))
            .unwrap_err()
            .is_expired());
    }

    #[test]
    fn test_oversized_clock_skew_does_not_overflow() {
        let options = SpOptions::new(SP_ENTITY_ID).with_clock_skew_seconds(9_000_000_000_000);
        let (handler, _store) = handler(options);

        let mut assertion = valid_assertion();
        assertion.conditions.not_before = Some(t0() + Duration::hours(1));
        assertion.conditions.not_on_or_after = Some(t0() - Duration::hours(1));

        assert!(handler.validate(&assertion, t0()).is_ok());
    }

    #[test]
    fn test_unrepresentable_clock_skew_is_configuration_error() {
        let err = xavyo_saml_sp::AssertionHandler::new(
            SpOptions::new(SP_ENTITY_ID).with_clock_skew_seconds(i64::MAX),
            std::sync::Arc::new(xavyo_saml_sp::InMemoryReplayStore::new()),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            SamlSpError::Configuration(ConfigurationError::DurationOutOfRange { seconds, .. })
                if seconds == i64::MAX
        ));
    }

    // ============================================================
    // Audience
    // ============================================================

    #[test]
    fn test_audience_falls_back_to_entity_id() {
        let (handler, _store) = default_handler();
        assert_eq!(handler.audience_policy().allowed(), [SP_ENTITY_ID]);

        assert!(handler.validate(&valid_assertion(), t0()).is_ok());

        let mut elsewhere = valid_assertion();
        elsewhere.conditions.audience_restrictions[0].audiences =
            vec!["https://other-sp.example.com".to_string()];
        let err = handler.validate(&elsewhere, t0()).unwrap_err();
        assert!(err.is_audience_mismatch());
    }

    #[test]
    fn test_configured_audiences_override_entity_id() {
        let options = SpOptions::new(SP_ENTITY_ID)
            .with_allowed_audiences(vec!["urn:sp:one", "urn:sp:two"]);
        let (handler, _store) = handler(options);

        // Addressed to the entity ID only: no longer accepted.
        let err = handler.validate(&valid_assertion(), t0()).unwrap_err();
        assert!(matches!(
            err,
            SamlSpError::Conditions(ConditionsError::AudienceMismatch { ref allowed, .. })
                if allowed == &["urn:sp:one".to_string(), "urn:sp:two".to_string()]
        ));

        let mut addressed = valid_assertion();
        addressed.conditions.audience_restrictions[0].audiences =
            vec!["urn:sp:two".to_string()];
        assert!(handler.validate(&addressed, t0()).is_ok());
    }

    #[test]
    fn test_every_declared_restriction_must_match() {
        let (handler, _store) = default_handler();
        let assertion = Assertion::builder("_two_restrictions", IDP_ISSUER)
            .not_on_or_after(t0() + Duration::minutes(5))
            .audience_restriction([SP_ENTITY_ID])
            .audience_restriction(["https://other-sp.example.com"])
            .build();

        assert!(handler
            .validate(&assertion, t0())
            .unwrap_err()
            .is_audience_mismatch());
    }

    #[test]
    fn test_missing_audience_restriction_rejected_when_enforced() {
        let (handler, _store) = default_handler();
        let mut assertion = valid_assertion();
        assertion.conditions.audience_restrictions.clear();

        assert!(handler
            .validate(&assertion, t0())
            .unwrap_err()
            .is_audience_mismatch());
    }

    #[test]
    fn test_disabled_audience_accepts_anything() {
        let options = SpOptions::new(SP_ENTITY_ID).with_audience_mode(AudienceMode::Disabled);
        let (handler, _store) = handler(options);

        let mut assertion = valid_assertion();
        assertion.conditions.audience_restrictions[0].audiences =
            vec!["https://other-sp.example.com".to_string()];
        assert!(handler.validate(&assertion, t0()).is_ok());

        let mut bare = valid_assertion();
        bare.conditions.audience_restrictions.clear();
        assert!(handler.validate(&bare, t0()).is_ok());
    }

    #[test]
    fn test_enforced_without_entity_id_is_configuration_error() {
        let err = xavyo_saml_sp::AssertionHandler::new(
            SpOptions::new(""),
            std::sync::Arc::new(xavyo_saml_sp::InMemoryReplayStore::new()),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            SamlSpError::Configuration(ConfigurationError::MissingEntityId)
        ));
        assert_eq!(err.stage(), ValidationStage::Received);
    }
}
