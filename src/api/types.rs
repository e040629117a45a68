//! Shared types for the API layer.

use std::sync::Arc;

use crate::db::RecordStore;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    /// Constructed once at start-up and injected here; handlers never open
    /// their own database handles.
    pub store: Arc<dyn RecordStore>,
    pub max_body_bytes: usize,
}

impl ApiContext {
    pub fn new(store: Arc<dyn RecordStore>, max_body_bytes: usize) -> Self {
        Self {
            store,
            max_body_bytes,
        }
    }
}
