// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response vocabulary tests: every error maps to its fixed token and
//! status.

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use workout_tracker::error::AppError;

async fn token_and_status(err: AppError) -> (serde_json::Value, StatusCode) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (serde_json::from_slice(&bytes).unwrap(), status)
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    for (err, token) in [
        (AppError::MissingUserId, "missing_user_id"),
        (AppError::MissingTgId, "missing_tg_id"),
        (AppError::MissingTpId, "missing_tp_id"),
        (AppError::MissingTpTypeId, "missing_tp_type_id"),
        (AppError::MissingValue, "missing_value"),
        (AppError::MissingTpType, "missing_tp_type"),
        (AppError::TpDoesNotExist, "tp_does_not_exist"),
        (AppError::SetDoesNotExist, "set_does_not_exist"),
        (AppError::TypeNotASet, "type_not_a_set"),
        (AppError::NothingToUpdate, "nothing_to_update"),
    ] {
        let (body, status) = token_and_status(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], token);
        assert!(body.get("tg_ids").is_none());
    }
}

#[tokio::test]
async fn test_conflict_attaches_open_group_ids() {
    let err = AppError::AlreadyStartedGroup(vec!["g1".to_string(), "g2".to_string()]);
    let (body, status) = token_and_status(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_started_group");
    assert_eq!(body["tg_ids"], serde_json::json!(["g1", "g2"]));
}

#[tokio::test]
async fn test_store_and_internal_errors_are_500() {
    let (body, status) = token_and_status(AppError::Database("boom".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    // The store message is logged, never leaked to the caller
    assert!(!body.to_string().contains("boom"));

    let (body, status) =
        token_and_status(AppError::Internal(anyhow::anyhow!("unexpected kind"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
}

#[tokio::test]
async fn test_auth_errors_are_401() {
    let (body, status) = token_and_status(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (body, status) = token_and_status(AppError::InvalidToken).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}
