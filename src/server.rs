//! HTTP server publishing the retention metrics group.

use axum::http::Method;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::retention::RetentionMetrics;
use crate::router::{create_router, AppState};

/// Read-only metrics server.
pub struct MetricsServer {
    bind_address: String,
    metrics: Arc<RetentionMetrics>,
}

impl MetricsServer {
    pub fn new(bind_address: impl Into<String>, metrics: Arc<RetentionMetrics>) -> Self {
        Self {
            bind_address: bind_address.into(),
            metrics,
        }
    }

    /// Binds the configured address and serves until `shutdown` is cancelled.
    pub async fn run(
        self,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.bind_address.parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` is cancelled.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let state = AppState {
            metrics: self.metrics.clone(),
        };

        let app = create_router(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET]),
                ),
        );

        info!("Metrics endpoint listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        Ok(())
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }
}
