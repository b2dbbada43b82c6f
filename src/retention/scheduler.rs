//! Timing loop for the retention scanner.

use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::ScanEngine;

/// Minimum time between the starts of two consecutive passes.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Runs passes back to back, no more than once per [`MIN_SCAN_INTERVAL`].
pub struct Scheduler {
    engine: ScanEngine,
}

impl Scheduler {
    pub fn new(engine: ScanEngine) -> Self {
        Self { engine }
    }

    /// Loops until `shutdown` is cancelled. Scan errors are logged and the
    /// next pass runs on schedule.
    pub async fn run(&self, shutdown: &CancellationToken) {
        let mut start = Instant::now();

        loop {
            let since = start.elapsed();
            if since < MIN_SCAN_INTERVAL {
                let wait = MIN_SCAN_INTERVAL - since;
                trace!(wait = ?wait, "Retention scanner sleeping");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = time::sleep(wait) => {}
                }
            }

            start = Instant::now();
            match self.engine.run_once(shutdown).await {
                Ok(outcome) if outcome.interrupted => {
                    info!(
                        deleted = outcome.deletes_succeeded,
                        failed = outcome.deletes_failed,
                        mailboxes = outcome.mailboxes_scanned,
                        "Retention scan aborted due to shutdown"
                    );
                }
                Ok(outcome) if outcome.deletes_attempted > 0 => {
                    info!(
                        deleted = outcome.deletes_succeeded,
                        failed = outcome.deletes_failed,
                        retained = outcome.retained,
                        mailboxes = outcome.mailboxes_scanned,
                        "Retention scan complete"
                    );
                }
                Ok(outcome) => {
                    debug!(
                        retained = outcome.retained,
                        mailboxes = outcome.mailboxes_scanned,
                        "Retention scan complete, no messages to delete"
                    );
                }
                Err(e) => {
                    error!(
                        error = %e,
                        transient = e.code.is_transient(),
                        "Error during retention scan"
                    );
                }
            }

            if shutdown.is_cancelled() {
                break;
            }
        }

        trace!("Retention scanner shut down");
    }
}
