// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use workout_tracker::config::Config;
use workout_tracker::db::FirestoreDb;
use workout_tracker::middleware::auth::{create_jwt, INTERNAL_ROLE};
use workout_tracker::routes::create_router;
use workout_tracker::services::PlatformApi;
use workout_tracker::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    // Points at a closed port; platform calls fail fast in tests.
    let platform = PlatformApi::new(config.platform_api_url.clone());

    let state = Arc::new(AppState {
        config,
        db,
        platform,
    });

    (create_router(state.clone()), state)
}

/// JWT for an ordinary user.
#[allow(dead_code)]
pub fn user_token(state: &AppState, user_id: &str) -> String {
    create_jwt(
        user_id,
        &["user".to_string()],
        &state.config.jwt_signing_key,
    )
    .expect("Failed to create JWT")
}

/// JWT for a trusted internal caller.
#[allow(dead_code)]
pub fn internal_token(state: &AppState, user_id: &str) -> String {
    create_jwt(
        user_id,
        &[INTERNAL_ROLE.to_string()],
        &state.config.jwt_signing_key,
    )
    .expect("Failed to create JWT")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}
