use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::endpoints::with_store;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::consent::aggregate::validate;
use crate::consent::{
    ApprovalStateMachine, ApprovalSummary, ConsentError, SubmissionPayload, ValidationError,
    ValidationIssue,
};

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub encounter: ApprovalSummary,
}

/// `POST /api/submit`: approve a pending encounter.
pub async fn submit(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(payload) = payload?;

    // Without an identifier there is nothing to resolve; report every
    // missing field at once.
    let Some(lookup) = payload.identifier() else {
        let err = match validate(&payload) {
            Err(e) => e,
            Ok(_) => ValidationError::from(ValidationIssue::MissingIdentifier),
        };
        return Err(ConsentError::Validation(err).into());
    };

    let summary = with_store(ctx.store, move |store| {
        ApprovalStateMachine::new(store)
            .submit(&lookup, &payload)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(SubmitResponse {
        success: true,
        encounter: summary,
    }))
}
