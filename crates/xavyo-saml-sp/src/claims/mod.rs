//! Claims identity construction.

mod builder;
mod identity;
mod logout;
pub mod statement;

pub use builder::ClaimsBuilder;
pub use identity::{
    claim_properties, claim_types, value_types, BootstrapContext, Claim, ClaimsIdentity,
};
pub use logout::{LogoutNameIdentifier, LogoutNameIdentifierError};

use thiserror::Error;

/// Errors building claims from a validated assertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsBuildError {
    /// A statement could not be converted.
    #[error("Malformed statement: {0}")]
    MalformedStatement(String),

    /// The authentication context carries a declaration reference.
    #[error("Unsupported authentication context declaration reference: {0}")]
    UnsupportedDeclarationReference(String),
}
