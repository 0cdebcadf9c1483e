// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tracking point model: one exercise entry inside a tracking group.
//!
//! A point's `data` is polymorphic: either one scalar value or an ordered
//! list of weight/rep sets. The shape is fixed at creation time by the
//! point type's declared data kind and never changes afterwards.

use serde::{Deserialize, Serialize};

/// Stored tracking point record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingPoint {
    /// Document id, populated on reads; Firestore owns id assignment.
    #[serde(alias = "_firestore_id", skip_serializing, default)]
    pub tp_id: Option<String>,
    /// Owner; immutable after creation
    pub user_id: String,
    /// The owning tracking group
    pub tg_id: String,
    /// Externally-defined point type (decides the `data` shape)
    pub tp_type_id: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Sequence number within the group
    pub tp_nr: u32,
    /// Scalar or set-list payload
    pub data: TpData,
}

/// A single scalar measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleValue {
    pub value: String,
}

/// One weight/rep set inside a set-list point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpSet {
    pub reps: String,
    pub value: String,
    pub is_dropset: bool,
    /// 1-based position in the list, assigned by append order
    pub set_nr: u32,
}

/// Polymorphic point payload. Serialized untagged: a set list is a JSON
/// array, a single value is an object, so the two never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TpData {
    Sets(Vec<TpSet>),
    Single(SingleValue),
}

/// Typed filter for point list queries.
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    pub user_id: String,
    pub tp_type_id: Option<String>,
    pub tg_id: Option<String>,
}

/// Partial update for one set, addressed by its `set_nr`.
///
/// A field is applied when present in the request body; `"0"` and the empty
/// string are legitimate supplied values.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPatch {
    pub set_nr: u32,
    pub reps: Option<String>,
    pub value: Option<String>,
    pub is_dropset: Option<bool>,
}

/// Why a set mutation could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetUpdateError {
    /// The point's payload is not a set list
    NotASetList,
    /// No set with the addressed `set_nr` exists
    NoSuchSet,
}

impl TpData {
    /// Append a new set, assigning the next contiguous `set_nr`.
    ///
    /// Returns the assigned number, or `None` if the payload is not a set
    /// list.
    pub fn push_set(&mut self, reps: String, value: String, is_dropset: bool) -> Option<u32> {
        let TpData::Sets(sets) = self else {
            return None;
        };
        let set_nr = sets.len() as u32 + 1;
        sets.push(TpSet {
            reps,
            value,
            is_dropset,
            set_nr,
        });
        Some(set_nr)
    }

    /// Overwrite the fields present in `patch` on the set it addresses.
    pub fn update_set(&mut self, patch: &SetPatch) -> Result<(), SetUpdateError> {
        let TpData::Sets(sets) = self else {
            return Err(SetUpdateError::NotASetList);
        };
        let index = (patch.set_nr as usize)
            .checked_sub(1)
            .filter(|i| *i < sets.len())
            .ok_or(SetUpdateError::NoSuchSet)?;

        let set = &mut sets[index];
        if let Some(reps) = &patch.reps {
            set.reps = reps.clone();
        }
        if let Some(value) = &patch.value {
            set.value = value.clone();
        }
        if let Some(is_dropset) = patch.is_dropset {
            set.is_dropset = is_dropset;
        }
        Ok(())
    }
}
