//! Retention metrics recorder.
//!
//! Written by the scan engine and sampled concurrently by a periodic
//! reporter. All state lives behind this type's own synchronization.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::SampleHistory;

/// Rendered sample histories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistorySnapshot {
    /// Cumulative delete count per sample.
    pub deletes_hist: String,
    /// Retained message count per sample.
    pub retained_hist: String,
}

/// The published `retention` metrics group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetentionVars {
    pub seconds_since_scan_completed: u64,
    pub deletes_hist: String,
    pub deletes_total: u64,
    pub period: u64,
    pub retained_hist: String,
    pub retained_current: u64,
}

/// Counters, gauges and bounded histories for the retention scanner.
pub struct RetentionMetrics {
    /// Completion time of the last full pass. Starts at creation time.
    scan_completed: RwLock<DateTime<Utc>>,
    deletes_total: AtomicU64,
    retained_current: AtomicU64,
    period_secs: AtomicU64,
    histories: Mutex<Histories>,
    rendered: RwLock<HistorySnapshot>,
}

struct Histories {
    deletes: SampleHistory,
    retained: SampleHistory,
}

impl RetentionMetrics {
    pub fn new(history_len: usize) -> Self {
        Self {
            scan_completed: RwLock::new(Utc::now()),
            deletes_total: AtomicU64::new(0),
            retained_current: AtomicU64::new(0),
            period_secs: AtomicU64::new(0),
            histories: Mutex::new(Histories {
                deletes: SampleHistory::new(history_len),
                retained: SampleHistory::new(history_len),
            }),
            rendered: RwLock::new(HistorySnapshot::default()),
        }
    }

    pub fn record_delete(&self) {
        self.deletes_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Overwrites the retained gauge with the count from the latest pass.
    pub fn set_retained(&self, retained: u64) {
        self.retained_current.store(retained, Ordering::Relaxed);
    }

    /// Records a completed pass. Instants older than the stored one are ignored.
    pub fn set_scan_completed(&self, completed_at: DateTime<Utc>) {
        let mut guard = self.scan_completed.write();
        if completed_at > *guard {
            *guard = completed_at;
        }
    }

    pub fn set_period(&self, period: Duration) {
        self.period_secs.store(period.as_secs(), Ordering::Relaxed);
    }

    pub fn deletes_total(&self) -> u64 {
        self.deletes_total.load(Ordering::Relaxed)
    }

    pub fn retained_current(&self) -> u64 {
        self.retained_current.load(Ordering::Relaxed)
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs.load(Ordering::Relaxed)
    }

    pub fn scan_completed(&self) -> DateTime<Utc> {
        *self.scan_completed.read()
    }

    pub fn seconds_since_scan_completed(&self) -> u64 {
        let elapsed = Utc::now() - self.scan_completed();
        elapsed.num_seconds().max(0) as u64
    }

    /// Pushes the current counters into the histories and returns them rendered.
    pub fn sample(&self) -> HistorySnapshot {
        let mut histories = self.histories.lock();
        histories.deletes.push(self.deletes_total());
        histories.retained.push(self.retained_current());
        let snapshot = HistorySnapshot {
            deletes_hist: histories.deletes.render(),
            retained_hist: histories.retained.render(),
        };
        // Published under the histories lock
        *self.rendered.write() = snapshot.clone();
        snapshot
    }

    /// Returns the last rendered histories without sampling.
    pub fn history(&self) -> HistorySnapshot {
        self.rendered.read().clone()
    }

    /// Returns the full metrics group as published.
    pub fn snapshot(&self) -> RetentionVars {
        let history = self.history();
        RetentionVars {
            seconds_since_scan_completed: self.seconds_since_scan_completed(),
            deletes_hist: history.deletes_hist,
            deletes_total: self.deletes_total(),
            period: self.period_secs(),
            retained_hist: history.retained_hist,
            retained_current: self.retained_current(),
        }
    }
}

impl Default for RetentionMetrics {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_LEN)
    }
}

/// Samples `metrics` every `every` until `shutdown` is cancelled.
pub fn spawn_metrics_ticker(
    metrics: Arc<RetentionMetrics>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let snapshot = metrics.sample();
                    trace!(
                        deletes = %snapshot.deletes_hist,
                        retained = %snapshot.retained_hist,
                        "Sampled retention metrics"
                    );
                }
            }
        }
    })
}
