//! Start/stop/join surface for the retention scanner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{RetentionMetrics, ScanEngine, Scheduler};
use crate::config::RetentionPolicy;
use crate::storage::MailboxStore;

/// Background scanner that deletes messages older than the retention period.
pub struct RetentionScanner {
    scheduler: Arc<Scheduler>,
    policy: RetentionPolicy,
    /// Cancelled by the host when the process is shutting down.
    shutdown: CancellationToken,
    /// Cancelled once the loop has exited, or at start when disabled.
    done: CancellationToken,
    started: AtomicBool,
}

impl RetentionScanner {
    pub fn new(
        store: Arc<dyn MailboxStore>,
        policy: RetentionPolicy,
        metrics: Arc<RetentionMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        metrics.set_period(policy.period());
        let engine = ScanEngine::new(store, policy, metrics);
        Self {
            scheduler: Arc::new(Scheduler::new(engine)),
            policy,
            shutdown,
            done: CancellationToken::new(),
            started: AtomicBool::new(false),
        }
    }

    /// Launches the scan loop on the current tokio runtime.
    ///
    /// With a zero period the scanner is marked finished immediately. Only
    /// the first call has any effect.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("Retention scanner already started");
            return;
        }

        if !self.policy.is_enabled() {
            info!("Retention scanner disabled");
            self.done.cancel();
            return;
        }

        info!(
            period_secs = self.policy.period().as_secs(),
            sleep_ms = self.policy.inter_collection_throttle().as_millis() as u64,
            "Retention configured for {:?}",
            self.policy.period()
        );

        let scheduler = self.scheduler.clone();
        let shutdown = self.shutdown.clone();
        let done = self.done.clone();
        tokio::spawn(async move {
            // Signals completion even if the loop unwinds
            let _done = done.drop_guard();
            scheduler.run(&shutdown).await;
        });
    }

    /// Waits until the scan loop has exited. Returns at once if `start` was
    /// never called.
    pub async fn join(&self) {
        if !self.started.load(Ordering::Acquire) {
            return;
        }
        self.done.cancelled().await;
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.done.is_cancelled()
    }
}
