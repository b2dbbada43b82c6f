//! Scanner configuration.

use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Default pause between mailboxes, in milliseconds.
pub const DEFAULT_RETENTION_SLEEP_MILLIS: u64 = 50;

/// Default metrics sampling interval, in seconds.
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 10;

/// Default number of samples kept per metrics history.
pub const DEFAULT_HISTORY_LEN: usize = 50;

/// Default port for the metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9800;

/// Command-line arguments for the scanner daemon.
#[derive(Parser, Debug, Clone)]
#[command(name = "mailprune")]
#[command(about = "Purges messages older than the retention period from a mailbox store")]
#[command(version)]
pub struct Args {
    /// Retention period in minutes (0 disables the scanner).
    #[arg(long, default_value_t = 0)]
    pub retention_minutes: u64,

    /// Pause after each mailbox, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RETENTION_SLEEP_MILLIS)]
    pub retention_sleep_millis: u64,

    /// Mailbox directory (in-memory store when omitted).
    #[arg(long, short = 'l')]
    pub location: Option<PathBuf>,

    /// Metrics sampling interval in seconds (0 disables sampling).
    #[arg(long, default_value_t = DEFAULT_METRICS_INTERVAL_SECS)]
    pub metrics_interval_secs: u64,

    /// Number of samples kept per metrics history.
    #[arg(long, default_value_t = DEFAULT_HISTORY_LEN)]
    pub history_len: usize,

    /// Host address for the metrics endpoint.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the metrics endpoint.
    #[arg(long, default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Do not serve the metrics endpoint.
    #[arg(long)]
    pub no_metrics_server: bool,

    /// Enable debug logging.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Enable silent mode (minimal logging).
    #[arg(long, short = 's')]
    pub silent: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            retention_minutes: 0,
            retention_sleep_millis: DEFAULT_RETENTION_SLEEP_MILLIS,
            location: None,
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
            history_len: DEFAULT_HISTORY_LEN,
            host: "127.0.0.1".to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            no_metrics_server: false,
            debug: false,
            silent: false,
        }
    }
}

/// Scanner configuration derived from command-line arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Retention period in minutes (0 disables the scanner).
    pub retention_minutes: u64,
    /// Pause after each mailbox, in milliseconds.
    pub retention_sleep_millis: u64,
    /// Mailbox directory, `None` for in-memory.
    pub location: Option<PathBuf>,
    /// Metrics sampling interval in seconds (0 disables sampling).
    pub metrics_interval_secs: u64,
    /// Number of samples kept per metrics history.
    pub history_len: usize,
    /// Host address for the metrics endpoint.
    pub host: String,
    /// Port for the metrics endpoint.
    pub metrics_port: u16,
    /// Whether to serve the metrics endpoint.
    pub metrics_server: bool,
    /// Enable debug logging.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config::from(Args::default())
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            retention_minutes: args.retention_minutes,
            retention_sleep_millis: args.retention_sleep_millis,
            location: args.location,
            metrics_interval_secs: args.metrics_interval_secs,
            history_len: args.history_len.max(1),
            host: args.host,
            metrics_port: args.metrics_port,
            metrics_server: !args.no_metrics_server,
            debug: args.debug,
        }
    }
}

impl Config {
    /// Builds the retention policy for the scanner.
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(
            Duration::from_secs(self.retention_minutes.saturating_mul(60)),
            Duration::from_millis(self.retention_sleep_millis),
        )
    }

    /// Returns the metrics sampling interval, `None` when disabled.
    pub fn metrics_interval(&self) -> Option<Duration> {
        (self.metrics_interval_secs > 0).then(|| Duration::from_secs(self.metrics_interval_secs))
    }

    /// Returns the bind address for the metrics endpoint.
    pub fn metrics_bind_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}

/// How long messages are kept and how hard the scanner may push the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    period: Duration,
    inter_collection_throttle: Duration,
}

impl RetentionPolicy {
    pub fn new(period: Duration, inter_collection_throttle: Duration) -> Self {
        Self {
            period,
            inter_collection_throttle,
        }
    }

    /// Maximum age a message may reach. Zero disables scanning.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Pause inserted after each mailbox.
    pub fn inter_collection_throttle(&self) -> Duration {
        self.inter_collection_throttle
    }

    pub fn is_enabled(&self) -> bool {
        !self.period.is_zero()
    }

    /// Messages dated strictly before the returned instant are expired.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match chrono::Duration::from_std(self.period) {
            Ok(period) => now.checked_sub_signed(period).unwrap_or(DateTime::<Utc>::MIN_UTC),
            Err(_) => DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Whether a message dated `date` is older than `cutoff`.
    pub fn is_expired(date: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
        date < cutoff
    }
}
