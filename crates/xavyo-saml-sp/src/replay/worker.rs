//! Background cleanup of expired replay records.
//!
//! Housekeeping only: expired records never block reuse, so validation stays
//! correct whether or not this worker runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;
use tracing::{debug, info, instrument, warn};

use super::store::ReplayStore;

/// Source of the current time for cleanup passes.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Cleanup worker configuration.
#[derive(Debug, Clone)]
pub struct ReplayCleanupConfig {
    /// How often to purge expired records (in seconds).
    pub cleanup_interval_secs: u64,
}

impl Default for ReplayCleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: 60,
        }
    }
}

/// Periodically removes expired records from a replay store.
pub struct ReplayCleanupWorker {
    store: Arc<dyn ReplayStore>,
    clock: Clock,
    config: ReplayCleanupConfig,
    shutdown: Arc<AtomicBool>,
}

impl ReplayCleanupWorker {
    /// Create a worker that reads wall-clock time.
    pub fn new(store: Arc<dyn ReplayStore>, config: ReplayCleanupConfig) -> Self {
        Self::with_clock(store, config, Arc::new(Utc::now))
    }

    /// Create a worker with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn ReplayStore>,
        config: ReplayCleanupConfig,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for requesting shutdown from another task.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Request shutdown; the loop exits on its next tick.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Run a single cleanup pass.
    pub fn run_once(&self) -> u64 {
        let now = (self.clock)();
        match self.store.cleanup_expired(now) {
            Ok(deleted) => {
                debug!(deleted = deleted, "Replay cleanup pass complete");
                deleted
            }
            Err(e) => {
                warn!(error = %e, "Replay cleanup pass failed");
                0
            }
        }
    }

    /// Run until shutdown is requested.
    #[instrument(skip(self))]
    pub async fn run(&self) {
        let period = Duration::from_secs(self.config.cleanup_interval_secs.max(1));
        self.run_every(period).await;
    }

    async fn run_every(&self, period: Duration) {
        info!(interval_ms = period.as_millis() as u64, "Starting replay cleanup worker");

        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Replay cleanup worker stopped");
                break;
            }
            self.run_once();
        }
    }
}
