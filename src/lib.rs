//! Mailprune: a background retention scanner for mailbox stores.
//!
//! The scanner walks every mailbox in a [`MailboxStore`], deletes messages
//! older than the configured retention period and records its progress in
//! [`RetentionMetrics`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mailprune::{Config, MemoryMailboxStore, RetentionMetrics, RetentionScanner};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config { retention_minutes: 60 * 24, ..Config::default() };
//!     let shutdown = CancellationToken::new();
//!     let scanner = RetentionScanner::new(
//!         Arc::new(MemoryMailboxStore::new()),
//!         config.retention_policy(),
//!         Arc::new(RetentionMetrics::new(config.history_len)),
//!         shutdown.clone(),
//!     );
//!     scanner.start();
//!     shutdown.cancel();
//!     scanner.join().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod retention;
pub mod router;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use config::{Args, Config, RetentionPolicy};
pub use error::{ErrorCode, StorageError, StorageResult};
pub use models::{MailboxModel, MessageModel};
pub use retention::{
    spawn_metrics_ticker, RetentionMetrics, RetentionScanner, RetentionVars, ScanEngine,
    ScanOutcome, Scheduler, MIN_SCAN_INTERVAL,
};
pub use server::MetricsServer;
pub use storage::{FsMailboxStore, MailboxStore, MemoryMailboxStore};
