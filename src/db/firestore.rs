// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Tracking groups (workout sessions)
//! - Tracking points (exercise entries)
//! - Open-session locks (one open group per user)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    GroupFilter, GroupPatch, OpenSession, PointFilter, TpData, TrackingGroup, TrackingPoint,
};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Field-mask payload for closing a group.
#[derive(Serialize, Deserialize)]
struct EndTimePatch {
    end_time: DateTime<Utc>,
}

/// Field-mask payload for replacing a point's data sequence.
#[derive(Serialize, Deserialize)]
struct DataPatch {
    data: TpData,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // ExternalJwtFunctionSource provides a dummy token without needing a
        // custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Release the connection. Safe to call when not connected (no-op);
    /// any later operation reports a database error.
    pub fn disconnect(&mut self) {
        if self.client.take().is_some() {
            tracing::info!("Database disconnected");
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Tracking Group Operations ───────────────────────────────

    /// List groups matching the typed filter.
    pub async fn query_groups(&self, filter: &GroupFilter) -> Result<Vec<TrackingGroup>, AppError> {
        let user_id = filter.user_id.clone();
        let notes = filter.notes.clone();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRACKING_GROUPS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    notes
                        .clone()
                        .and_then(|notes| q.field("notes").eq(notes)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's open groups (end_time still null).
    pub async fn query_open_groups(&self, user_id: &str) -> Result<Vec<TrackingGroup>, AppError> {
        let user_id = user_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRACKING_GROUPS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("end_time").is_null(),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a group by document id.
    pub async fn get_group(&self, tg_id: &str) -> Result<Option<TrackingGroup>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRACKING_GROUPS)
            .obj()
            .one(tg_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new group with a store-generated id.
    ///
    /// Returns the stored group with `tg_id` populated.
    pub async fn insert_group(&self, group: &TrackingGroup) -> Result<TrackingGroup, AppError> {
        self.get_client()?
            .fluent()
            .insert()
            .into(collections::TRACKING_GROUPS)
            .generate_document_id()
            .object(group)
            .execute::<TrackingGroup>()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply a partial update to a group, touching only the present fields.
    pub async fn update_group(&self, tg_id: &str, patch: &GroupPatch) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(patch.field_mask())
            .in_col(collections::TRACKING_GROUPS)
            .document_id(tg_id)
            .object(patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Close a group by recording its end time.
    pub async fn set_group_end_time(
        &self,
        tg_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(vec!["end_time".to_string()])
            .in_col(collections::TRACKING_GROUPS)
            .document_id(tg_id)
            .object(&EndTimePatch { end_time })
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a group document.
    pub async fn delete_group(&self, tg_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TRACKING_GROUPS)
            .document_id(tg_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Tracking Point Operations ───────────────────────────────

    /// List points matching the typed filter.
    pub async fn query_points(&self, filter: &PointFilter) -> Result<Vec<TrackingPoint>, AppError> {
        let user_id = filter.user_id.clone();
        let tp_type_id = filter.tp_type_id.clone();
        let tg_id = filter.tg_id.clone();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRACKING_POINTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    tp_type_id
                        .clone()
                        .and_then(|id| q.field("tp_type_id").eq(id)),
                    tg_id.clone().and_then(|id| q.field("tg_id").eq(id)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a point by document id.
    pub async fn get_point(&self, tp_id: &str) -> Result<Option<TrackingPoint>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRACKING_POINTS)
            .obj()
            .one(tp_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new point with a store-generated id.
    pub async fn insert_point(&self, point: &TrackingPoint) -> Result<TrackingPoint, AppError> {
        self.get_client()?
            .fluent()
            .insert()
            .into(collections::TRACKING_POINTS)
            .generate_document_id()
            .object(point)
            .execute::<TrackingPoint>()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace a point's data sequence, leaving every other field untouched.
    pub async fn set_point_data(&self, tp_id: &str, data: &TpData) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(vec!["data".to_string()])
            .in_col(collections::TRACKING_POINTS)
            .document_id(tp_id)
            .object(&DataPatch { data: data.clone() })
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a point document.
    pub async fn delete_point(&self, tp_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TRACKING_POINTS)
            .document_id(tp_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete every point under a group.
    ///
    /// Uses concurrent deletes with a limit to avoid overloading Firestore.
    /// Returns the number of documents deleted.
    pub async fn delete_points_by_group(&self, tg_id: &str) -> Result<usize, AppError> {
        let tg_id_filter = tg_id.to_string();
        let points: Vec<TrackingPoint> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRACKING_POINTS)
            .filter(move |q| q.for_all([q.field("tg_id").eq(tg_id_filter.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let client = self.get_client()?;
        let ids: Vec<String> = points.into_iter().filter_map(|p| p.tp_id).collect();
        let count = ids.len();

        stream::iter(ids)
            .map(|doc_id| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::TRACKING_POINTS)
                    .document_id(&doc_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(tg_id, count, "Deleted points for group");

        Ok(count)
    }

    // ─── Open-Session Lock Operations ────────────────────────────

    /// Acquire the open-session lock for a user (create-if-absent).
    ///
    /// Returns `false` when the lock already exists, which is the losing
    /// side of a concurrent start.
    pub async fn create_open_session(&self, lock: &OpenSession) -> Result<bool, AppError> {
        let result = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::OPEN_SESSIONS)
            .document_id(&lock.user_id)
            .object(lock)
            .execute::<OpenSession>()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Get a user's open-session lock, if any.
    pub async fn get_open_session(&self, user_id: &str) -> Result<Option<OpenSession>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::OPEN_SESSIONS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Release a user's open-session lock. No-op if it does not exist.
    pub async fn delete_open_session(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::OPEN_SESSIONS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
