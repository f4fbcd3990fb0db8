// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use backend_bootstrap::db::StoreError;
use backend_bootstrap::error::AppError;
use backend_bootstrap::services::OAuthError;
use backend_bootstrap::storage::ObjectStoreError;

async fn status_and_message(err: AppError) -> (StatusCode, String) {
    let response = err.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json["message"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_client_errors_keep_their_message() {
    assert_eq!(
        status_and_message(AppError::Unauthorized("who are you".to_string())).await,
        (StatusCode::UNAUTHORIZED, "who are you".to_string())
    );
    assert_eq!(
        status_and_message(AppError::Forbidden("no access".to_string())).await,
        (StatusCode::FORBIDDEN, "no access".to_string())
    );
    assert_eq!(
        status_and_message(AppError::BadRequest("bad".to_string())).await,
        (StatusCode::BAD_REQUEST, "bad".to_string())
    );
    assert_eq!(
        status_and_message(AppError::NotFound("nope".to_string())).await,
        (StatusCode::NOT_FOUND, "nope".to_string())
    );
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let (status, message) =
        status_and_message(AppError::Database("connection reset by peer".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "database error");

    let (status, message) =
        status_and_message(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "internal error");

    let (status, message) =
        status_and_message(OAuthError::Exchange("status 400".to_string()).into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message, "authentication failed");
}

#[test]
fn test_store_error_mapping() {
    assert!(matches!(
        AppError::from(StoreError::NotFound),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        AppError::from(StoreError::Conflict("u1".to_string())),
        AppError::Database(_)
    ));
    assert!(matches!(
        AppError::from(StoreError::Backend("timeout".to_string())),
        AppError::Database(_)
    ));
}

#[test]
fn test_object_store_error_mapping() {
    assert!(matches!(
        AppError::from(ObjectStoreError::NotFound("k".to_string())),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        AppError::from(ObjectStoreError::InvalidKey("../k".to_string())),
        AppError::FileStore(_)
    ));
    assert!(matches!(
        AppError::from(ObjectStoreError::Backend("503".to_string())),
        AppError::FileStore(_)
    ));
}
