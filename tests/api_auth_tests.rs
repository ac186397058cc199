// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid access tokens
//! 2. Protected routes accept the token from a cookie or a Bearer header
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tower::ServiceExt;
use uuid::Uuid;
use vidshare_api::config::Config;

mod common;
use common::{body_json, empty_request, login, register, send};

/// Sign an access-shaped token with an arbitrary key and expiry offset.
fn create_test_jwt(user_id: Uuid, signing_key: &[u8], exp_offset: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        iat: i64,
        exp: i64,
        jti: String,
        typ: &'static str,
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + exp_offset,
        jti: Uuid::new_v4().to_string(),
        typ: "access",
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = common::create_test_app();

    let response = send(&app, empty_request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();

    let response = send(
        &app,
        empty_request("GET", "/api/v1/users/current-user", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_bad_tokens() {
    let (app, _) = common::create_test_app();
    let config = Config::test_default();
    let user_id = Uuid::new_v4();

    let tokens = [
        "not-a-jwt".to_string(),
        create_test_jwt(user_id, b"wrong_key", 3600),
        create_test_jwt(user_id, &config.access_token_secret, -60),
        // Signed with the refresh secret
        create_test_jwt(user_id, &config.refresh_token_secret, 3600),
    ];

    for token in tokens {
        let response = send(
            &app,
            empty_request("GET", "/api/v1/users/current-user", Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "token: {token}");
    }
}

#[tokio::test]
async fn test_refresh_token_rejected_by_guard() {
    let (app, _) = common::create_test_app();
    register(&app, "alice").await;
    let session = login(&app, "alice").await;

    let response = send(
        &app,
        empty_request(
            "GET",
            "/api/v1/users/current-user",
            Some(&session.refresh_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_bearer_token() {
    let (app, _) = common::create_test_app();
    register(&app, "bob").await;
    let session = login(&app, "bob").await;

    let response = send(
        &app,
        empty_request(
            "GET",
            "/api/v1/users/current-user",
            Some(&session.access_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_with_cookie() {
    let (app, _) = common::create_test_app();
    register(&app, "carol").await;
    let session = login(&app, "carol").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/current-user")
                .header(
                    header::COOKIE,
                    format!("accessToken={}", session.access_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "carol");
}

#[tokio::test]
async fn test_access_token_survives_logout_until_expiry() {
    let (app, _) = common::create_test_app();
    register(&app, "dave").await;
    let session = login(&app, "dave").await;

    let response = send(
        &app,
        empty_request("POST", "/api/v1/users/logout", Some(&session.access_token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The guard is stateless; only the refresh token is revoked.
    let response = send(
        &app,
        empty_request(
            "GET",
            "/api/v1/users/current-user",
            Some(&session.access_token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/users/login")
                .header(header::ORIGIN, state.config.cors_origin.as_str())
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        state.config.cors_origin.as_str()
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/users/login")
                .header(header::ORIGIN, "https://evil.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
