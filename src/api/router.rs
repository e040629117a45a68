//! Booklet API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Layer stack (outermost → innermost):
//! CORS → Cache-Control → audit logger → body limit → handler

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the booklet API router.
///
/// Handlers use `State<ApiContext>`; the audit layer is stateless.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn consent_api_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.max_body_bytes;

    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/encounters/:identifier", get(endpoints::encounters::by_path))
        .route("/encounter", get(endpoints::encounters::by_query))
        .route("/submit", post(endpoints::submissions::submit))
        .with_state(ctx)
        // Innermost first, outermost last
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        // Consent pages carry patient data; never let a shared device cache them
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // The booklet is served from a different origin
        .layer(CorsLayer::permissive());

    Router::new().nest("/api", routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::DEFAULT_MAX_BODY_BYTES;
    use crate::consent::testing::{complete_body, seeded_store};
    use crate::db::{RecordStore, SqliteRecordStore};

    fn test_app() -> (Router, Arc<SqliteRecordStore>) {
        let store = Arc::new(seeded_store());
        let ctx = ApiContext::new(store.clone(), DEFAULT_MAX_BODY_BYTES);
        (consent_api_router(ctx), store)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn submit_request(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/submit")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok_with_headers() {
        let (app, _) = test_app();
        let response = app.oneshot(get_request("/api/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        assert!(response.headers().contains_key("X-Request-Id"));
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn pending_encounter_renders_bootstrap_form() {
        let (app, _) = test_app();
        let response = app
            .oneshot(get_request("/api/encounters/abc123"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["medicalRecordNumber"], "MR-0001");
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["form"]["mode"], "bootstrap");
        assert_eq!(json["form"]["patientChecklist"]["check3"], false);
        assert_eq!(json["form"]["requiresStaffName"], true);
        assert!(!json.to_string().contains("abc123"));
    }

    #[tokio::test]
    async fn legacy_record_number_link_still_resolves() {
        let (app, _) = test_app();
        let response = app
            .oneshot(get_request("/api/encounters/MR-0001"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_token_returns_404() {
        let (app, _) = test_app();
        let response = app.oneshot(get_request("/api/encounters/zzz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn query_lookup_by_record_number() {
        let (app, _) = test_app();
        let response = app
            .oneshot(get_request("/api/encounter?medical_record_number=MR-0001"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["patientName"], "Maria Pattiasina");
    }

    #[tokio::test]
    async fn query_lookup_without_identifier_is_400() {
        let (app, _) = test_app();
        let response = app.oneshot(get_request("/api/encounter")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn complete_submission_approves() {
        let (app, store) = test_app();
        let response = app.oneshot(submit_request(&complete_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["encounter"]["status"], "Approved");
        assert_eq!(json["encounter"]["note"], "Patient asked about anaesthesia");
        assert!(json["encounter"]["approvedAt"].is_string());
        assert!(json["encounter"].get("token").is_none());

        let stored = store.find_by_token("abc123").unwrap().unwrap();
        assert!(stored.is_approved());
    }

    #[tokio::test]
    async fn resubmission_returns_409_and_keeps_first_approval() {
        let (app, store) = test_app();
        let first = app
            .clone()
            .oneshot(submit_request(&complete_body()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let approved_at = store.find_by_token("abc123").unwrap().unwrap().approved_at();

        let second = app.oneshot(submit_request(&complete_body())).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let json = body_json(second).await;
        assert_eq!(json["error"]["code"], "ALREADY_APPROVED");

        let after = store.find_by_token("abc123").unwrap().unwrap().approved_at();
        assert_eq!(after, approved_at);
    }

    #[tokio::test]
    async fn unchecked_item_returns_422_with_details() {
        let (app, store) = test_app();
        let mut body = complete_body();
        body["patientChecklist"]["check3"] = json!(false);

        let response = app.oneshot(submit_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        let details = json["error"]["details"].as_array().unwrap();
        assert_eq!(details.len(), 1);
        assert!(details[0].as_str().unwrap().contains("check3"));

        let stored = store.find_by_token("abc123").unwrap().unwrap();
        assert!(!stored.is_approved());
    }

    #[tokio::test]
    async fn submission_without_identifier_is_422() {
        let (app, _) = test_app();
        let mut body = complete_body();
        body.as_object_mut().unwrap().remove("token");

        let response = app.oneshot(submit_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["details"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submission_for_unknown_token_is_404() {
        let (app, _) = test_app();
        let mut body = complete_body();
        body["token"] = json!("zzz");

        let response = app.oneshot(submit_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn body_with_numeric_staff_name() -> Value {
        let mut body = complete_body();
        body["staffName"] = json!(42);
        body
    }

    #[tokio::test]
    async fn wrongly_typed_field_on_pending_is_422() {
        let (app, store) = test_app();
        let response = app
            .oneshot(submit_request(&body_with_numeric_staff_name()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["details"][0], "staffName must be text");
        assert!(!store.find_by_token("abc123").unwrap().unwrap().is_approved());
    }

    #[tokio::test]
    async fn wrongly_typed_field_on_approved_is_409() {
        let (app, _) = test_app();
        let first = app
            .clone()
            .oneshot(submit_request(&complete_body()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let response = app
            .oneshot(submit_request(&body_with_numeric_staff_name()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn wrongly_typed_field_on_unknown_is_404() {
        let (app, _) = test_app();
        let mut body = body_with_numeric_staff_name();
        body["token"] = json!("zzz");

        let response = app.oneshot(submit_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_note_is_echoed_verbatim() {
        let (app, _) = test_app();
        let mut body = complete_body();
        body["note"] = json!("   ");

        let response = app.oneshot(submit_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["encounter"]["note"], "   ");
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (app, _) = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/submit")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let store = Arc::new(seeded_store());
        let app = consent_api_router(ApiContext::new(store, 256));
        let mut body = complete_body();
        body["signatureImage"] = json!("A".repeat(1024));

        let response = app.oneshot(submit_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn approved_encounter_renders_read_only() {
        let (app, _) = test_app();
        let submitted = app
            .clone()
            .oneshot(submit_request(&complete_body()))
            .await
            .unwrap();
        assert_eq!(submitted.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request("/api/encounter?token=abc123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "Approved");
        assert_eq!(json["form"]["mode"], "read_only");
        assert_eq!(json["form"]["editable"], false);
        assert_eq!(json["form"]["staffName"], "Nurse Jane");
        assert_eq!(json["form"]["signatureImage"], "<png-b64>");
        assert_eq!(json["form"]["staffChecklist"]["pain_management"], true);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let (app, _) = test_app();
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/submit")
            .header("Origin", "https://booklet.example.org")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
