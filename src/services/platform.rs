// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Platform API client.
//!
//! Handles the two cross-service concerns this service delegates:
//! - Resolving a tracking-point type definition (which decides whether a
//!   point's data is a single value or a set list)
//! - Cascading point deletion when a tracking group is removed, so this
//!   service never reaches into the point schema from the group side
//!
//! Both calls are a single round trip; failures surface to the caller
//! immediately, with no retry.

use crate::error::AppError;
use serde::Deserialize;

/// Data kind a point type can declare for its points.
pub const DATA_KIND_SETS: &str = "sets";
pub const DATA_KIND_SINGLE_VALUE: &str = "single-value";

/// Platform API client.
#[derive(Clone)]
pub struct PlatformApi {
    http: reqwest::Client,
    base_url: String,
}

/// A tracking-point type definition owned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct TpType {
    pub tp_type_id: String,
    /// `"sets"` or `"single-value"`
    pub data_kind: String,
    pub measurement_unit: Option<String>,
}

/// Envelope the platform wraps type lookups in. An empty `data` array means
/// the type does not exist for that user.
#[derive(Debug, Deserialize)]
struct TypeLookupResponse {
    data: Vec<TpType>,
}

impl PlatformApi {
    /// Create a new platform client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Resolve a user's tracking-point type definition.
    ///
    /// Returns `None` when the type does not exist for that user.
    pub async fn get_user_type(
        &self,
        user_id: &str,
        tp_type_id: &str,
    ) -> Result<Option<TpType>, AppError> {
        let url = format!("{}/type", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("user_id", user_id), ("tp_type_id", tp_type_id)])
            .send()
            .await
            .map_err(|e| AppError::Database(format!("Platform API request failed: {}", e)))?;

        let lookup: TypeLookupResponse = Self::check_response_json(response).await?;
        Ok(lookup.data.into_iter().next())
    }

    /// Delete every tracking point under a group.
    ///
    /// The platform routes this back into the point collection's bulk-delete
    /// path under its internal role, keeping this service's group side
    /// decoupled from the point schema.
    pub async fn delete_points_by_group(&self, tg_id: &str) -> Result<(), AppError> {
        let url = format!("{}/point", self.base_url);

        let response = self
            .http
            .delete(&url)
            .query(&[("tg_id", tg_id)])
            .send()
            .await
            .map_err(|e| AppError::Database(format!("Platform API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!(
                "Platform API cascade delete failed: HTTP {}: {}",
                status, body
            )));
        }

        tracing::debug!(tg_id, "Cascade point deletion triggered");
        Ok(())
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!(
                "Platform API error: HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Database(format!("Platform API response parse error: {}", e)))
    }
}
