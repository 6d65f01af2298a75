//! Replay attack prevention tests

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use chrono::Duration;
    use xavyo_saml_sp::{
        Assertion, InMemoryReplayStore, ReplayError, ReplayGuard, ReplayStore, SamlSpError,
        SpOptions, ValidationStage,
    };

    use crate::common::{default_handler, handler, t0, valid_assertion, IDP_ISSUER, SP_ENTITY_ID};

    // ============================================================
    // Basic Replay Attack Tests
    // ============================================================

    #[test]
    fn test_second_submission_blocked() {
        let (handler, _store) = default_handler();
        let assertion = valid_assertion();

        assert!(handler.validate(&assertion, t0()).is_ok());

        let err = handler.validate(&assertion, t0()).unwrap_err();
        assert!(err.is_replay());
        assert_eq!(err.stage(), ValidationStage::Replay);
    }

    #[test]
    fn test_replay_error_contains_details() {
        let (handler, _store) = default_handler();
        let assertion = valid_assertion();

        handler.validate(&assertion, t0()).unwrap();
        let result = handler.validate(&assertion, t0() + Duration::seconds(30));

        match result {
            Err(SamlSpError::Replay(ReplayError::Replayed {
                assertion_id,
                expires_at,
            })) => {
                assert_eq!(assertion_id, assertion.id);
                assert_eq!(Some(expires_at), assertion.conditions.not_on_or_after);
            }
            other => panic!("Expected Replayed error, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_replay_attempts_all_blocked() {
        let (handler, _store) = default_handler();
        let assertion = valid_assertion();

        handler.validate(&assertion, t0()).unwrap();
        for i in 1..=5 {
            let result = handler.validate(&assertion, t0() + Duration::seconds(i));
            assert!(result.unwrap_err().is_replay(), "attempt {i} should be blocked");
        }
    }

    #[test]
    fn test_distinct_assertions_are_independent() {
        let (handler, store) = default_handler();

        for _ in 0..3 {
            handler.validate(&valid_assertion(), t0()).unwrap();
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_rejected_conditions_do_not_record_id() {
        let (handler, store) = default_handler();
        let assertion = valid_assertion();

        // Before NotBefore: rejected without touching the replay store.
        let err = handler
            .validate(&assertion, t0() - Duration::minutes(10))
            .unwrap_err();
        assert_eq!(err.stage(), ValidationStage::Conditions);
        assert!(store.get(&assertion.id).unwrap().is_none());

        assert!(handler.validate(&assertion, t0()).is_ok());
    }

    // ============================================================
    // Replay Expiry
    // ============================================================

    #[test]
    fn test_replay_expiry_follows_not_on_or_after_with_frozen_clock() {
        let store = Arc::new(InMemoryReplayStore::new());
        let guard = ReplayGuard::new(store.clone(), Duration::minutes(5));
        let now = t0();

        // NotBefore far in the past must not shorten the record.
        let assertion = Assertion::builder("_frozen", IDP_ISSUER)
            .not_before(now - Duration::days(30))
            .not_on_or_after(now + Duration::minutes(10))
            .build();

        guard.check_and_record(&assertion, now).unwrap();

        let record = store.get("_frozen").unwrap().unwrap();
        assert_eq!(record.expires_at, now + Duration::minutes(10));
        assert_eq!(record.recorded_at, now);

        // Still blocked one second before expiry at the same frozen clock.
        let err = guard
            .check_and_record(&assertion, now + Duration::minutes(10) - Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(err, ReplayError::Replayed { .. }));
    }

    #[test]
    fn test_id_reusable_after_record_expires() {
        let store = Arc::new(InMemoryReplayStore::new());
        let guard = ReplayGuard::new(store.clone(), Duration::minutes(5));
        let expires_at = t0() + Duration::minutes(1);

        guard.check_and_record_id("_reuse", expires_at, t0()).unwrap();
        assert!(guard
            .check_and_record_id("_reuse", expires_at, t0() + Duration::seconds(30))
            .is_err());

        let later = expires_at + Duration::seconds(1);
        guard
            .check_and_record_id("_reuse", later + Duration::minutes(1), later)
            .unwrap();
        assert_eq!(
            store.get("_reuse").unwrap().unwrap().expires_at,
            later + Duration::minutes(1)
        );
    }

    #[test]
    fn test_missing_not_on_or_after_uses_fallback_ttl() {
        let (handler, store) = handler(SpOptions::new(SP_ENTITY_ID));
        let assertion = Assertion::builder("_no_expiry", IDP_ISSUER)
            .audience_restriction([SP_ENTITY_ID])
            .build();

        handler.validate(&assertion, t0()).unwrap();

        let record = store.get("_no_expiry").unwrap().unwrap();
        assert_eq!(record.expires_at, t0() + Duration::seconds(300));
    }

    #[test]
    fn test_oversized_fallback_ttl_saturates() {
        let mut options = SpOptions::new(SP_ENTITY_ID);
        options.replay_fallback_ttl_seconds = 9_000_000_000_000;
        let (handler, store) = handler(options);
        let assertion = Assertion::builder("_long_ttl", IDP_ISSUER)
            .audience_restriction([SP_ENTITY_ID])
            .build();

        handler.validate(&assertion, t0()).unwrap();

        let record = store.get("_long_ttl").unwrap().unwrap();
        assert_eq!(record.expires_at, chrono::DateTime::<chrono::Utc>::MAX_UTC);
        assert!(handler.validate(&assertion, t0()).unwrap_err().is_replay());
    }

    #[test]
    fn test_empty_assertion_id_rejected() {
        let (handler, store) = default_handler();
        let mut assertion = valid_assertion();
        assertion.id = String::new();

        let err = handler.validate(&assertion, t0()).unwrap_err();
        assert!(matches!(
            err,
            SamlSpError::Replay(ReplayError::MissingAssertionId)
        ));
        assert!(store.is_empty());
    }

    // ============================================================
    // Concurrency
    // ============================================================

    #[test]
    fn test_concurrent_submissions_exactly_one_succeeds() {
        const THREADS: usize = 16;

        let (handler, store) = default_handler();
        let handler = Arc::new(handler);
        let assertion = Arc::new(valid_assertion());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let handler = Arc::clone(&handler);
                let assertion = Arc::clone(&assertion);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    handler.validate(&assertion, t0())
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("validation thread panicked"))
            .collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let replays = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_replay()))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(replays, THREADS - 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_store_inserts_exactly_one_succeeds() {
        const THREADS: usize = 32;

        let store = Arc::new(InMemoryReplayStore::new());
        let barrier = Arc::new(Barrier::new(THREADS));
        let expires_at = t0() + Duration::minutes(5);

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.check_and_insert("_race", expires_at, t0()).is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().expect("insert thread panicked"))
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
    }
}
