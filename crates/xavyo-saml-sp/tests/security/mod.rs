//! Security tests for SAML assertion validation

pub mod conditions_tests;
pub mod replay_tests;
