//! Mailprune: purges expired messages from a mailbox store.

use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use mailprune::{
    spawn_metrics_ticker, Args, Config, FsMailboxStore, MailboxStore, MemoryMailboxStore,
    MetricsServer, RetentionMetrics, RetentionScanner,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug {
        Level::DEBUG
    } else if args.silent {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from(args);

    let store: Arc<dyn MailboxStore> = match &config.location {
        Some(path) => {
            info!("Using mailbox directory {}", path.display());
            Arc::new(FsMailboxStore::new(path.clone()).await?)
        }
        None => {
            info!("Using in-memory mailbox store");
            Arc::new(MemoryMailboxStore::new())
        }
    };

    let shutdown = CancellationToken::new();
    let metrics = Arc::new(RetentionMetrics::new(config.history_len));

    let scanner = RetentionScanner::new(
        store,
        config.retention_policy(),
        metrics.clone(),
        shutdown.clone(),
    );
    scanner.start();

    let ticker = config
        .metrics_interval()
        .map(|every| spawn_metrics_ticker(metrics.clone(), every, shutdown.clone()));

    let server = config.metrics_server.then(|| {
        let server = MetricsServer::new(config.metrics_bind_address(), metrics.clone());
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = server.run(shutdown).await {
                error!("Metrics server failed: {}", e);
            }
        })
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    shutdown.cancel();

    scanner.join().await;
    if let Some(ticker) = ticker {
        ticker.await?;
    }
    if let Some(server) = server {
        server.await?;
    }

    Ok(())
}
