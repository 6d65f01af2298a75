//! Replay detection for assertion IDs.
//!
//! An assertion ID is remembered until the assertion's own `NotOnOrAfter`.
//! Stores implement an atomic check-and-insert so concurrent submissions of
//! the same assertion cannot both succeed.

pub mod guard;
pub mod store;
pub mod types;
pub mod worker;

pub use guard::ReplayGuard;
pub use store::{InMemoryReplayStore, ReplayStore};
pub use types::{ReplayError, ReplayRecord};
pub use worker::{Clock, ReplayCleanupConfig, ReplayCleanupWorker};
