use std::sync::Arc;

use market_blob::{BlobStore, FilesystemBlobStore};
use market_ingest::{IngestPipeline, RepairSweeper};
use market_store::{InMemoryItemStore, ItemStore};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::router::build_router;

/// Market catalog server.
pub struct MarketServer {
    config: ServerConfig,
    state: AppState,
}

impl MarketServer {
    /// Open the picture directory and start with an empty record store.
    pub async fn open(config: ServerConfig) -> ServerResult<Self> {
        let blobs = FilesystemBlobStore::new(&config.blob_root).await?;
        Ok(Self::with_stores(
            config,
            Arc::new(InMemoryItemStore::new()),
            Arc::new(blobs),
        ))
    }

    /// Assemble a server around caller-provided stores.
    pub fn with_stores(
        config: ServerConfig,
        items: Arc<dyn ItemStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let pipeline = IngestPipeline::new(
            items,
            blobs,
            config.hash_algorithm.oracle(),
            config.ingest_config(),
        );
        Self {
            state: AppState::new(Arc::new(pipeline)),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<IngestPipeline> {
        &self.state.pipeline
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(
            self.state.clone(),
            &self.config.blob_root,
            self.config.body_limit(),
        )
    }

    /// Serve until Ctrl-C, running the repair sweeper alongside.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = self.config.sweep_interval().map(|interval| {
            RepairSweeper::new(self.state.pipeline.clone(), interval, self.config.sweep_grace())
                .spawn(shutdown_rx)
        });

        tracing::info!(
            bind = %self.config.bind_addr,
            public = %self.config.public_address,
            blobs = %self.config.blob_root.display(),
            oracle = self.state.pipeline.oracle().name(),
            sweeper = sweeper.is_some(),
            "market server listening"
        );
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        let _ = shutdown_tx.send(true);
        if let Some(handle) = sweeper {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "repair sweeper panicked");
            }
        }
        tracing::info!("market server stopped");
        Ok(served?)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
