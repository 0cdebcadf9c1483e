// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure a handler can produce maps to a fixed token from a closed
//! vocabulary, paired with an HTTP status: 400 for validation/not-found/
//! conflict, 401 for auth, 500 for store and internal failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Missing user id")]
    MissingUserId,

    #[error("Missing tracking group id")]
    MissingTgId,

    #[error("Missing tracking point id")]
    MissingTpId,

    #[error("Missing tracking point type id")]
    MissingTpTypeId,

    #[error("Missing single value for tracking point")]
    MissingValue,

    #[error("Tracking point type does not exist")]
    MissingTpType,

    #[error("Tracking point does not exist")]
    TpDoesNotExist,

    #[error("Set does not exist")]
    SetDoesNotExist,

    #[error("Tracking point type is not a set type")]
    TypeNotASet,

    #[error("No updatable field supplied")]
    NothingToUpdate,

    #[error("User already has an open tracking group")]
    AlreadyStartedGroup(Vec<String>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    /// Open group ids, attached to the already-started conflict only.
    #[serde(skip_serializing_if = "Option::is_none")]
    tg_ids: Option<Vec<String>>,
}

impl AppError {
    /// The fixed response token for this error.
    pub fn token(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidToken => "invalid_token",
            AppError::MissingUserId => "missing_user_id",
            AppError::MissingTgId => "missing_tg_id",
            AppError::MissingTpId => "missing_tp_id",
            AppError::MissingTpTypeId => "missing_tp_type_id",
            AppError::MissingValue => "missing_value",
            AppError::MissingTpType => "missing_tp_type",
            AppError::TpDoesNotExist => "tp_does_not_exist",
            AppError::SetDoesNotExist => "set_does_not_exist",
            AppError::TypeNotASet => "type_not_a_set",
            AppError::NothingToUpdate => "nothing_to_update",
            AppError::AlreadyStartedGroup(_) => "already_started_group",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
            _ => {}
        }

        let tg_ids = match &self {
            AppError::AlreadyStartedGroup(ids) => Some(ids.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.token().to_string(),
            tg_ids,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
