// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking point route validation tests.
//!
//! Runs against the offline mock database and an unreachable platform API:
//! a 400 with the expected token proves the request was rejected before any
//! store or platform access.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_create_requires_tp_type_id() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/point")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"tg_id":"g1","tp_nr":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "missing_tp_type_id");
}

#[tokio::test]
async fn test_create_resolves_type_via_platform() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/point")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"tg_id":"g1","tp_type_id":"bench","tp_nr":1}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    // Validation passed; the unreachable platform API fails the lookup
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "database_error");
}

#[tokio::test]
async fn test_delete_requires_tp_id() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/point")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "missing_tp_id");
}

#[tokio::test]
async fn test_delete_with_tg_id_alone_is_not_bulk_for_users() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    // An ordinary caller supplying only tg_id must not reach the bulk
    // path; the single-point path still requires tp_id
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/point?tg_id=g1")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "missing_tp_id");
}

#[tokio::test]
async fn test_internal_bulk_delete_reaches_store() {
    let (app, state) = common::create_test_app();
    let token = common::internal_token(&state, "svc-1");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/point?tg_id=g1")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The internal caller takes the bulk path straight to the (offline) store
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "database_error");
}

#[tokio::test]
async fn test_append_set_requires_tp_id() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/point/set")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"tp_set":{"reps":"8","value":"60"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "missing_tp_id");
}

#[tokio::test]
async fn test_update_set_requires_tp_id() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/point/set")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"tp_set":{"set_nr":1,"reps":"5"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "missing_tp_id");
}

#[tokio::test]
async fn test_append_set_looks_up_point_before_platform() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, "12345");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/point/set")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"tp_id":"p1","tp_set":{"reps":"8","value":"60"}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    // The point is loaded before the type lookup, so the offline store
    // fails the request first
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "database_error");
}
