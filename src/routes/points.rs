// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking point routes: exercise entries inside a tracking group.
//!
//! A point's data shape is decided at creation time by its type definition,
//! which only the platform API knows. Set-typed points grow one set at a
//! time through the `/point/set` sub-operations.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthContext;
use crate::models::{PointFilter, SetPatch, SetUpdateError, SingleValue, TpData, TrackingPoint};
use crate::routes::Ack;
use crate::services::platform;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/point",
            get(list_points).post(create_point).delete(delete_points),
        )
        .route("/point/set", post(append_set).put(update_set))
}

// ─── List ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PointListQuery {
    /// Acting user id (internal callers only)
    user_id: Option<String>,
    tp_type_id: Option<String>,
    tg_id: Option<String>,
}

/// Full point document as returned to clients.
#[derive(Serialize)]
pub struct PointResponse {
    pub tp_id: String,
    pub user_id: String,
    pub tg_id: String,
    pub tp_type_id: String,
    pub notes: Option<String>,
    pub tp_nr: u32,
    pub data: TpData,
}

impl From<TrackingPoint> for PointResponse {
    fn from(point: TrackingPoint) -> Self {
        Self {
            tp_id: point.tp_id.unwrap_or_default(),
            user_id: point.user_id,
            tg_id: point.tg_id,
            tp_type_id: point.tp_type_id,
            notes: point.notes,
            tp_nr: point.tp_nr,
            data: point.data,
        }
    }
}

/// List the acting user's points, optionally narrowed by type or group.
async fn list_points(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<PointListQuery>,
) -> Result<Json<Vec<PointResponse>>> {
    let user_id = ctx.effective_user_id(params.user_id.as_deref())?;

    let points = state
        .db
        .query_points(&PointFilter {
            user_id,
            tp_type_id: params.tp_type_id,
            tg_id: params.tg_id,
        })
        .await?;

    Ok(Json(points.into_iter().map(PointResponse::from).collect()))
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreatePointRequest {
    tg_id: String,
    tp_type_id: Option<String>,
    notes: Option<String>,
    tp_nr: u32,
    /// Required when the resolved type is single-value, ignored otherwise
    data: Option<SingleValueRequest>,
}

#[derive(Deserialize)]
struct SingleValueRequest {
    value: String,
}

/// Create a tracking point, shaping its data by the resolved type.
async fn create_point(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<CreatePointRequest>,
) -> Result<Ack> {
    let user_id = ctx.user_id.clone();
    let tp_type_id = body.tp_type_id.ok_or(AppError::MissingTpTypeId)?;

    let tp_type = state
        .platform
        .get_user_type(&user_id, &tp_type_id)
        .await?
        .ok_or(AppError::MissingTpType)?;

    let data = initial_data(&tp_type.data_kind, body.data)?;

    let point = TrackingPoint {
        tp_id: None,
        user_id,
        tg_id: body.tg_id,
        tp_type_id,
        notes: body.notes,
        tp_nr: body.tp_nr,
        data,
    };
    state.db.insert_point(&point).await?;

    Ok(Ack::Added)
}

// ─── Delete ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct DeletePointQuery {
    /// Acting user id (internal callers only)
    user_id: Option<String>,
    tg_id: Option<String>,
    tp_id: Option<String>,
}

/// Delete one owned point, or every point under a group for the platform's
/// cascade (internal role, `tg_id` supplied).
async fn delete_points(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<DeletePointQuery>,
) -> Result<Ack> {
    // Bulk path: the cascade acts on a whole group, not on a single owner.
    if ctx.is_internal() {
        if let Some(tg_id) = &params.tg_id {
            let count = state.db.delete_points_by_group(tg_id).await?;
            tracing::info!(tg_id = %tg_id, count, "Bulk point deletion");
            return Ok(Ack::DeletedMany);
        }
    }

    let user_id = ctx.effective_user_id(params.user_id.as_deref())?;
    let tp_id = params.tp_id.ok_or(AppError::MissingTpId)?;

    // Deleting an unknown or foreign point is a no-op that still
    // acknowledges; deletion is idempotent from the caller's view.
    if let Some(point) = state.db.get_point(&tp_id).await? {
        if point.user_id == user_id {
            state.db.delete_point(&tp_id).await?;
        }
    }

    Ok(Ack::Deleted)
}

// ─── Sets ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AppendSetRequest {
    tp_id: Option<String>,
    tp_set: NewSetRequest,
}

#[derive(Deserialize)]
struct NewSetRequest {
    reps: String,
    value: String,
    #[serde(default)]
    is_dropset: bool,
}

/// Append a set to a set-typed point, numbering it after the last one.
async fn append_set(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<AppendSetRequest>,
) -> Result<Ack> {
    let user_id = ctx.user_id.clone();
    let tp_id = body.tp_id.ok_or(AppError::MissingTpId)?;

    let mut point = owned_point(&state, &tp_id, &user_id).await?;
    ensure_set_type(&state, &user_id, &point.tp_type_id).await?;

    let set = body.tp_set;
    let set_nr = point
        .data
        .push_set(set.reps, set.value, set.is_dropset)
        .ok_or_else(|| non_set_data(&tp_id))?;

    state.db.set_point_data(&tp_id, &point.data).await?;

    tracing::debug!(tp_id = %tp_id, set_nr, "Set appended");
    Ok(Ack::Added)
}

#[derive(Deserialize)]
struct UpdateSetRequest {
    tp_id: Option<String>,
    tp_set: SetPatch,
}

/// Overwrite the supplied fields of one existing set, addressed by number.
async fn update_set(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<UpdateSetRequest>,
) -> Result<Ack> {
    let user_id = ctx.user_id.clone();
    let tp_id = body.tp_id.ok_or(AppError::MissingTpId)?;

    let mut point = owned_point(&state, &tp_id, &user_id).await?;
    ensure_set_type(&state, &user_id, &point.tp_type_id).await?;

    point.data.update_set(&body.tp_set).map_err(|e| match e {
        SetUpdateError::NoSuchSet => AppError::SetDoesNotExist,
        SetUpdateError::NotASetList => non_set_data(&tp_id),
    })?;

    state.db.set_point_data(&tp_id, &point.data).await?;

    Ok(Ack::Updated)
}

// ─── Helpers ─────────────────────────────────────────────────

/// Fetch a point only if it belongs to the acting user.
async fn owned_point(state: &AppState, tp_id: &str, user_id: &str) -> Result<TrackingPoint> {
    state
        .db
        .get_point(tp_id)
        .await?
        .filter(|p| p.user_id == user_id)
        .ok_or(AppError::TpDoesNotExist)
}

/// Resolve the point's type and require the set-list kind.
async fn ensure_set_type(state: &AppState, user_id: &str, tp_type_id: &str) -> Result<()> {
    let tp_type = state
        .platform
        .get_user_type(user_id, tp_type_id)
        .await?
        .ok_or(AppError::MissingTpType)?;

    if tp_type.data_kind != platform::DATA_KIND_SETS {
        return Err(AppError::TypeNotASet);
    }
    Ok(())
}

/// A set-typed point whose stored payload is not a set list is corrupt.
fn non_set_data(tp_id: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "set-typed point {} holds non-set data",
        tp_id
    ))
}

/// Shape a new point's payload from the type's declared data kind.
///
/// Set-typed points start with an empty list; single-value points take the
/// caller's scalar. A kind this service does not know is an internal fault,
/// not a caller error.
fn initial_data(data_kind: &str, supplied: Option<SingleValueRequest>) -> Result<TpData> {
    match data_kind {
        platform::DATA_KIND_SETS => Ok(TpData::Sets(vec![])),
        platform::DATA_KIND_SINGLE_VALUE => {
            let value = supplied.ok_or(AppError::MissingValue)?.value;
            Ok(TpData::Single(SingleValue { value }))
        }
        other => Err(AppError::Internal(anyhow::anyhow!(
            "unexpected data kind {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_typed_points_start_empty() {
        let data = initial_data(
            platform::DATA_KIND_SETS,
            Some(SingleValueRequest {
                value: "ignored".to_string(),
            }),
        )
        .unwrap();
        assert_eq!(data, TpData::Sets(vec![]));
    }

    #[test]
    fn test_single_value_points_take_the_scalar() {
        let data = initial_data(
            platform::DATA_KIND_SINGLE_VALUE,
            Some(SingleValueRequest {
                value: "82.5".to_string(),
            }),
        )
        .unwrap();
        assert_eq!(
            data,
            TpData::Single(SingleValue {
                value: "82.5".to_string()
            })
        );
    }

    #[test]
    fn test_single_value_requires_the_scalar() {
        let err = initial_data(platform::DATA_KIND_SINGLE_VALUE, None).unwrap_err();
        assert!(matches!(err, AppError::MissingValue));
    }

    #[test]
    fn test_unknown_kind_is_internal() {
        let err = initial_data("telemetry", None).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
