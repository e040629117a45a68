//! Booklet API server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.
//! The binary awaits the handle; tests bind `127.0.0.1:0` and stop it
//! explicitly.

use std::net::SocketAddr;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::consent_api_router;
use crate::api::types::ApiContext;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind booklet API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to get server address: {0}")]
    LocalAddr(#[source] std::io::Error),

    #[error("Booklet API server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Session metadata for a running server.
#[derive(Debug, Clone, Serialize)]
pub struct ServerSession {
    pub session_id: String,
    pub server_addr: SocketAddr,
    pub started_at: String,
}

/// Handle to a running booklet API server.
pub struct ConsentServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ConsentServer {
    /// Ask the server to stop accepting connections and drain in-flight ones.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Booklet API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn stopped(self) -> Result<(), ServerError> {
        self.task.await?;
        Ok(())
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        self.shutdown();
        self.stopped().await
    }
}

/// Start the booklet API server on `addr`.
///
/// Port 0 picks an ephemeral port; the bound address is in the session.
pub async fn start_server_on(
    ctx: ApiContext,
    addr: SocketAddr,
) -> Result<ConsentServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = consent_api_router(ctx);

    let session = ServerSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr,
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Booklet API server received shutdown signal");
        };

        tracing::info!(%addr, "Booklet API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Booklet API server error: {e}");
        }

        tracing::info!("Booklet API server stopped");
    });

    Ok(ConsentServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
