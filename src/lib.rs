pub mod api; // Booklet HTTP API
pub mod config;
pub mod consent; // Resolver, aggregate, approval, view
pub mod db;
pub mod models;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::{start_server_on, ApiContext, ServerError};
use crate::config::{ConfigError, ServerConfig};
use crate::db::{DatabaseError, RecordStore, SqliteRecordStore};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot open record store: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Read configuration, open the store once, serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    tracing::info!("Surgical consent starting v{}", config::APP_VERSION);

    let config = ServerConfig::from_env()?;
    config.ensure_data_dir()?;

    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::open(&config.db_path)?);
    tracing::info!(db_path = %config.db_path.display(), "Record store ready");

    let ctx = ApiContext::new(store, config.max_body_bytes);
    let mut server = start_server_on(ctx, config.bind_addr).await?;

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    tracing::info!("Shutdown requested");

    server.shutdown();
    server.stopped().await?;
    Ok(())
}
