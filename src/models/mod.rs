// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod group;
pub mod point;

pub use group::{GroupFilter, GroupPatch, OpenSession, TrackingGroup};
pub use point::{PointFilter, SetPatch, SetUpdateError, SingleValue, TpData, TpSet, TrackingPoint};
