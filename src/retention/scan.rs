//! Single retention pass over every mailbox.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::RetentionMetrics;
use crate::config::RetentionPolicy;
use crate::error::StorageResult;
use crate::storage::MailboxStore;

/// Results from a single retention pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Mailboxes whose messages were fully processed.
    pub mailboxes_scanned: u64,
    pub deletes_attempted: u64,
    pub deletes_succeeded: u64,
    pub deletes_failed: u64,
    /// Messages younger than the cutoff.
    pub retained: u64,
    /// Set when the pass covered every mailbox.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set when shutdown stopped the pass between mailboxes.
    pub interrupted: bool,
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Walks the store and deletes expired messages.
pub struct ScanEngine {
    store: Arc<dyn MailboxStore>,
    policy: RetentionPolicy,
    metrics: Arc<RetentionMetrics>,
}

impl ScanEngine {
    pub fn new(
        store: Arc<dyn MailboxStore>,
        policy: RetentionPolicy,
        metrics: Arc<RetentionMetrics>,
    ) -> Self {
        Self {
            store,
            policy,
            metrics,
        }
    }

    /// Performs one pass using the current time for the cutoff.
    pub async fn run_once(&self, shutdown: &CancellationToken) -> StorageResult<ScanOutcome> {
        self.run_at(Utc::now(), shutdown).await
    }

    /// Performs one pass with the cutoff computed from `now`.
    ///
    /// Listing failures abort the pass and are returned. A failed delete is
    /// logged and counted, and the pass moves on to the next message. When
    /// `shutdown` fires during the pause after a mailbox, the remaining
    /// mailboxes are skipped and the partial outcome is returned as `Ok`
    /// without publishing completion.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        shutdown: &CancellationToken,
    ) -> StorageResult<ScanOutcome> {
        let cutoff = self.policy.cutoff(now);
        debug!(cutoff = %cutoff, "Starting retention scan");

        let mailboxes = self.store.list_mailboxes().await?;
        let mut outcome = ScanOutcome::default();

        for mailbox in &mailboxes {
            let messages = match self.store.list_messages(&mailbox.name).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(mailbox = %mailbox.name, error = %e, "Failed to list messages");
                    return Err(e);
                }
            };

            for message in &messages {
                if !RetentionPolicy::is_expired(message.date, cutoff) {
                    outcome.retained += 1;
                    continue;
                }

                trace!(mailbox = %mailbox.name, id = %message.id, "Purging expired message");
                outcome.deletes_attempted += 1;
                match self.store.delete_message(&mailbox.name, &message.id).await {
                    Ok(()) => {
                        outcome.deletes_succeeded += 1;
                        self.metrics.record_delete();
                    }
                    Err(e) => {
                        outcome.deletes_failed += 1;
                        error!(
                            mailbox = %mailbox.name,
                            id = %message.id,
                            error = %e,
                            "Failed to purge message"
                        );
                    }
                }
            }
            outcome.mailboxes_scanned += 1;

            // Reduce store thrashing between mailboxes
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(
                        scanned = outcome.mailboxes_scanned,
                        total = mailboxes.len(),
                        "Retention scan aborted due to shutdown"
                    );
                    outcome.interrupted = true;
                    return Ok(outcome);
                }
                _ = time::sleep(self.policy.inter_collection_throttle()) => {}
            }
        }

        let completed_at = Utc::now();
        self.metrics.set_scan_completed(completed_at);
        self.metrics.set_retained(outcome.retained);
        outcome.completed_at = Some(completed_at);

        Ok(outcome)
    }
}
