//! Tests for `AppError` to HTTP response mapping.
//!
//! These call `IntoResponse` directly; no server is needed.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use drapely_api::error::AppError;
use drapely_core::error::CoreError;
use drapely_pipeline::QueueError;
use http_body_util::BodyExt;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("user_id must not be empty".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "user_id must not be empty");
}

#[tokio::test]
async fn unauthorized_error_returns_401_with_challenge() {
    let response =
        AppError::Core(CoreError::Unauthorized("Invalid API key".into())).into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Bearer");
}

#[tokio::test]
async fn full_queue_returns_503() {
    let (status, json) = error_to_response(QueueError::Full.into()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn closed_queue_returns_503() {
    let err = AppError::from(QueueError::Closed);
    assert_matches!(err, AppError::ServiceUnavailable(_));

    let (status, _) = error_to_response(err).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn config_error_is_sanitized() {
    let err = AppError::Core(CoreError::Config("CLOUDINARY_API_SECRET=abc".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

