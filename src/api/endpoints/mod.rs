//! API endpoint handlers.
//!
//! Handlers stay thin: they extract, hand the store to the consent workflow
//! on a blocking thread, and map the outcome to JSON.

pub mod encounters;
pub mod health;
pub mod submissions;

use std::sync::Arc;

use crate::api::error::ApiError;
use crate::db::RecordStore;

/// Run a store-bound closure off the async executor.
pub(crate) async fn with_store<T, F>(store: Arc<dyn RecordStore>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn RecordStore) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("Store task failed: {e}")))?
}
