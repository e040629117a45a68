//! Booklet HTTP API.
//!
//! Exposes encounter lookup and consent submission to the booklet client.
//! Routes are nested under `/api/` behind an audit-logging layer.
//!
//! The router is composable: `consent_api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::consent_api_router;
pub use server::{start_server_on, ConsentServer, ServerError, ServerSession};
pub use types::ApiContext;
