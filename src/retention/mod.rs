//! Retention scanning for expired messages.
//!
//! A [`RetentionScanner`] owns one background task that repeatedly runs a
//! [`ScanEngine`] pass over every mailbox, at most once a minute, and
//! reports into a shared [`RetentionMetrics`]. Shutdown is a single
//! [`tokio_util::sync::CancellationToken`] observed at every wait.

mod history;
mod metrics;
mod scan;
mod scanner;
mod scheduler;

pub use history::*;
pub use metrics::*;
pub use scan::*;
pub use scanner::*;
pub use scheduler::*;
