//! Encounter lookup endpoints.
//!
//! - `GET /api/encounters/:identifier`: one value, token first then record number
//! - `GET /api/encounter?token=&medical_record_number=`: explicit fields

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::with_store;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::consent::{load_view, ConsentView, IdentifierLookup};

/// `GET /api/encounters/:identifier`
pub async fn by_path(
    State(ctx): State<ApiContext>,
    Path(identifier): Path<String>,
) -> Result<Json<ConsentView>, ApiError> {
    let lookup = IdentifierLookup::single(&identifier)
        .ok_or_else(|| ApiError::BadRequest("An identifier is required".into()))?;
    fetch(ctx, lookup).await
}

#[derive(Debug, Deserialize)]
pub struct EncounterQuery {
    pub token: Option<String>,
    pub medical_record_number: Option<String>,
}

/// `GET /api/encounter`
pub async fn by_query(
    State(ctx): State<ApiContext>,
    Query(query): Query<EncounterQuery>,
) -> Result<Json<ConsentView>, ApiError> {
    let lookup = IdentifierLookup::new(
        query.token.as_deref(),
        query.medical_record_number.as_deref(),
    )
    .ok_or_else(|| {
        ApiError::BadRequest("Either token or medical_record_number is required".into())
    })?;
    fetch(ctx, lookup).await
}

async fn fetch(ctx: ApiContext, lookup: IdentifierLookup) -> Result<Json<ConsentView>, ApiError> {
    let view = with_store(ctx.store, move |store| {
        load_view(store, &lookup).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(view))
}
