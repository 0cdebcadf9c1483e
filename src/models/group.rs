// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tracking group model: one workout session per document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored tracking group record in Firestore.
///
/// A group is "open" while `end_time` is null. At most one open group may
/// exist per user; the invariant is enforced by the [`OpenSession`] lock
/// document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingGroup {
    /// Document id, populated on reads. Never written into the document
    /// body; Firestore owns id assignment.
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub tg_id: Option<String>,
    /// Owner; immutable after creation
    pub user_id: String,
    /// When the workout was started
    pub start_time: DateTime<Utc>,
    /// When the workout was stopped; null while the session is open
    pub end_time: Option<DateTime<Utc>>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Lock document enforcing the one-open-group-per-user invariant.
///
/// Lives in its own collection, keyed by `user_id`, so create-if-absent
/// doubles as an atomic "acquire". Created on start, removed on stop and on
/// deletion of an open group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSession {
    pub user_id: String,
    /// The open group this lock belongs to
    pub tg_id: String,
}

/// Typed filter for group list queries.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub user_id: String,
    pub notes: Option<String>,
}

/// Partial update for a tracking group.
///
/// A field is applied when it is present in the request body; values like
/// an empty string are legitimate updates. The patch is written with a field
/// mask so absent fields are left untouched in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl GroupPatch {
    /// Names of the fields present in this patch, in store field order.
    pub fn field_mask(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.start_time.is_some() {
            fields.push("start_time".to_string());
        }
        if self.notes.is_some() {
            fields.push("notes".to_string());
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.notes.is_none()
    }
}

impl TrackingGroup {
    /// Whether the session is still open (no end time recorded).
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}
