//! Coredrop Ingest - Crash-dump upload endpoint
//!
//! HTTP service receiving core dumps from host agents. Each upload carries
//! a header, a core image and the crashed executable; the artifacts land in
//! a content-addressed directory tree and a record goes to the index.

mod config;
mod dto;
mod handlers;
mod routes;

use anyhow::{Context, Result};
use coredrop_domain::ingestion::{IngestionConfig, IngestionService};
use coredrop_fs::{FsArtifactStore, JsonFileIndex};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestion_service: Arc<IngestionService<FsArtifactStore, JsonFileIndex>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration files and environment
    let config = Config::load()?;

    // Initialize tracing
    init_tracing(config.log_format);

    info!("Starting coredrop ingest service");
    if let Some(path) = &config.conf_file {
        info!(path = %path.display(), "Loaded configuration file");
    }

    let store = FsArtifactStore::open(config.artifacts_dir())
        .context("initializing artifact store")?;
    let index = JsonFileIndex::open(config.index_dir())
        .await
        .context("initializing index")?;

    info!(data_dir = %config.data_dir.display(), "Storage initialized");

    // Create ingestion service
    let mut ingestion_config = IngestionConfig::default();
    if let Some(limit) = config.drain_limit {
        ingestion_config.drain_limit = limit;
    }
    if let Some(size) = config.max_header_size {
        ingestion_config.max_header_size = size;
    }
    let service = IngestionService::new(store, index, ingestion_config);

    // Create shared application state
    let state = AppState {
        ingestion_service: Arc::new(service),
    };

    // Build HTTP router
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    info!(addr = %addr, "Starting HTTP server");

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
    }
}
