//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::consent::ConsentError;

/// Seconds a client should wait before retrying after a store failure.
const STORE_RETRY_AFTER_SECS: u64 = 1;

/// Structured error response body for booklet clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Encounter not found")]
    NotFound,
    #[error("Consent already approved")]
    AlreadyApproved,
    #[error("Validation failed: {0:?}")]
    ValidationFailed(Vec<String>),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "No booklet matches this link. Please check the link you were given.".to_string(),
                Vec::new(),
            ),
            ApiError::AlreadyApproved => (
                StatusCode::CONFLICT,
                "ALREADY_APPROVED",
                "This consent has already been submitted.".to_string(),
                Vec::new(),
            ),
            ApiError::ValidationFailed(issues) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                "Please complete all sections before submitting.".to_string(),
                issues,
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail, Vec::new())
            }
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request body too large".to_string(),
                Vec::new(),
            ),
            ApiError::StoreUnavailable(detail) => {
                tracing::error!(detail, "Record store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "Temporarily unavailable, please retry".to_string(),
                    Vec::new(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                    Vec::new(),
                )
            }
        };
        let retry = status == StatusCode::SERVICE_UNAVAILABLE;

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if retry {
            if let Ok(val) = axum::http::HeaderValue::from_str(&STORE_RETRY_AFTER_SECS.to_string())
            {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<ConsentError> for ApiError {
    fn from(err: ConsentError) -> Self {
        match err {
            ConsentError::PatientNotFound => ApiError::NotFound,
            ConsentError::AlreadyApproved => ApiError::AlreadyApproved,
            ConsentError::Validation(e) => {
                ApiError::ValidationFailed(e.issues.iter().map(ToString::to_string).collect())
            }
            ConsentError::Store(e) if e.is_transient() => {
                ApiError::StoreUnavailable(e.to_string())
            }
            ConsentError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}
