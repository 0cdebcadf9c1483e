// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout-Tracker: record workout sessions and the exercises inside them
//!
//! This crate provides the tracking microservice of the platform: tracking
//! groups (one workout session each) and tracking points (exercise entries
//! holding either a single value or a list of weight/rep sets). Point type
//! definitions and cascade deletion are delegated to the platform API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::PlatformApi;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub platform: PlatformApi,
}
