// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking group routes: one workout session per group.
//!
//! A user has at most one open group at a time. The open-session lock
//! document is the authoritative guard; the pre-insert query in `start` is
//! only a fast path that also supplies the conflicting group ids.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthContext;
use crate::models::{GroupFilter, GroupPatch, OpenSession, TrackingGroup};
use crate::routes::Ack;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Group routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/group",
            get(list_groups).put(update_group).delete(delete_group),
        )
        .route("/group/start", post(start_group))
        .route("/group/stop", post(stop_group))
}

// ─── List ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GroupListQuery {
    /// Acting user id (internal callers only)
    user_id: Option<String>,
    tg_id: Option<String>,
    notes: Option<String>,
}

/// Group projection returned by list.
#[derive(Serialize)]
pub struct GroupSummary {
    pub tg_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<TrackingGroup> for GroupSummary {
    fn from(group: TrackingGroup) -> Self {
        Self {
            tg_id: group.tg_id.unwrap_or_default(),
            start_time: group.start_time,
            end_time: group.end_time,
            notes: group.notes,
        }
    }
}

/// List the acting user's groups, optionally narrowed by id or notes.
async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<GroupListQuery>,
) -> Result<Json<Vec<GroupSummary>>> {
    let user_id = ctx.effective_user_id(params.user_id.as_deref())?;

    let groups: Vec<TrackingGroup> = if let Some(tg_id) = &params.tg_id {
        // Document ids are not queryable fields; narrow by direct lookup.
        state
            .db
            .get_group(tg_id)
            .await?
            .into_iter()
            .filter(|g| g.user_id == user_id)
            .filter(|g| {
                params
                    .notes
                    .as_ref()
                    .is_none_or(|notes| g.notes.as_ref() == Some(notes))
            })
            .collect()
    } else {
        state
            .db
            .query_groups(&GroupFilter {
                user_id,
                notes: params.notes,
            })
            .await?
    };

    Ok(Json(groups.into_iter().map(GroupSummary::from).collect()))
}

// ─── Start ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct StartGroupRequest {
    notes: Option<String>,
}

/// Open a new tracking group (start a workout).
///
/// Always acts as the token subject; starting is never delegated.
async fn start_group(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<StartGroupRequest>,
) -> Result<Ack> {
    let user_id = ctx.user_id.clone();

    // Fast path: reject before writing anything, with the open ids attached.
    let open = state.db.query_open_groups(&user_id).await?;
    if !open.is_empty() {
        return Err(AppError::AlreadyStartedGroup(open_ids(&open)));
    }

    let group = TrackingGroup {
        tg_id: None,
        user_id: user_id.clone(),
        start_time: Utc::now(),
        end_time: None,
        notes: body.notes,
    };
    let created = state.db.insert_group(&group).await?;
    let tg_id = created.tg_id.unwrap_or_default();

    let lock = OpenSession {
        user_id: user_id.clone(),
        tg_id: tg_id.clone(),
    };
    if !state.db.create_open_session(&lock).await? {
        return lost_start_race(&state, &lock).await;
    }

    tracing::info!(user_id = %user_id, tg_id = %tg_id, "Tracking group started");
    Ok(Ack::Added)
}

/// Resolve a failed lock acquisition during start.
///
/// The losing side of a live race backs out its insert and reports the
/// winner's open group. A lock with no open group behind it was left by an
/// interrupted stop and is reclaimed instead.
async fn lost_start_race(state: &AppState, lock: &OpenSession) -> Result<Ack> {
    let open = state.db.query_open_groups(&lock.user_id).await?;
    let others: Vec<String> = open
        .iter()
        .filter_map(|g| g.tg_id.clone())
        .filter(|id| *id != lock.tg_id)
        .collect();

    if others.is_empty() {
        state.db.delete_open_session(&lock.user_id).await?;
        if state.db.create_open_session(lock).await? {
            tracing::warn!(
                user_id = %lock.user_id,
                tg_id = %lock.tg_id,
                "Reclaimed stale open-session lock"
            );
            return Ok(Ack::Added);
        }
    }

    state.db.delete_group(&lock.tg_id).await?;
    Err(AppError::AlreadyStartedGroup(others))
}

fn open_ids(groups: &[TrackingGroup]) -> Vec<String> {
    groups.iter().filter_map(|g| g.tg_id.clone()).collect()
}

// ─── Stop ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StopGroupQuery {
    /// Acting user id (internal callers only)
    user_id: Option<String>,
    tg_id: Option<String>,
}

/// Close a tracking group (finish a workout).
async fn stop_group(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<StopGroupQuery>,
) -> Result<Ack> {
    let user_id = ctx.effective_user_id(params.user_id.as_deref())?;
    let tg_id = params.tg_id.ok_or(AppError::MissingTgId)?;

    // Unknown or foreign group: nothing matched, nothing written.
    let Some(group) = owned_group(&state, &tg_id, &user_id).await? else {
        return Ok(Ack::Stopped);
    };

    state.db.set_group_end_time(&tg_id, Utc::now()).await?;

    if group.is_open() {
        release_lock_for(&state, &user_id, &tg_id).await?;
    }

    tracing::info!(user_id = %user_id, tg_id = %tg_id, "Tracking group stopped");
    Ok(Ack::Stopped)
}

// ─── Update ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct UpdateGroupRequest {
    tg_id: Option<String>,
    start_time: Option<DateTime<Utc>>,
    notes: Option<String>,
}

/// Partial update of a group's start time and notes.
async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<UpdateGroupRequest>,
) -> Result<Ack> {
    let tg_id = body.tg_id.ok_or(AppError::MissingTgId)?;

    let patch = GroupPatch {
        start_time: body.start_time,
        notes: body.notes,
    };
    if patch.is_empty() {
        return Err(AppError::NothingToUpdate);
    }

    if owned_group(&state, &tg_id, &ctx.user_id).await?.is_some() {
        state.db.update_group(&tg_id, &patch).await?;
    }

    Ok(Ack::Updated)
}

// ─── Delete ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct DeleteGroupQuery {
    /// Acting user id (internal callers only)
    user_id: Option<String>,
    tg_id: Option<String>,
}

/// Delete a group and cascade-delete its points via the platform API.
async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<DeleteGroupQuery>,
) -> Result<Ack> {
    let user_id = ctx.effective_user_id(params.user_id.as_deref())?;
    let tg_id = params.tg_id.ok_or(AppError::MissingTgId)?;

    let Some(group) = owned_group(&state, &tg_id, &user_id).await? else {
        return Ok(Ack::Deleted);
    };

    // Points first: a cascade failure leaves the group intact instead of
    // orphaning its points.
    state.platform.delete_points_by_group(&tg_id).await?;
    state.db.delete_group(&tg_id).await?;

    if group.is_open() {
        release_lock_for(&state, &user_id, &tg_id).await?;
    }

    tracing::info!(user_id = %user_id, tg_id = %tg_id, "Tracking group deleted");
    Ok(Ack::Deleted)
}

// ─── Helpers ─────────────────────────────────────────────────

/// Fetch a group only if it belongs to the acting user.
async fn owned_group(
    state: &AppState,
    tg_id: &str,
    user_id: &str,
) -> Result<Option<TrackingGroup>> {
    Ok(state
        .db
        .get_group(tg_id)
        .await?
        .filter(|g| g.user_id == user_id))
}

/// Release the user's open-session lock if it points at this group.
async fn release_lock_for(state: &AppState, user_id: &str, tg_id: &str) -> Result<()> {
    if let Some(lock) = state.db.get_open_session(user_id).await? {
        if lock.tg_id == tg_id {
            state.db.delete_open_session(user_id).await?;
        }
    }
    Ok(())
}
