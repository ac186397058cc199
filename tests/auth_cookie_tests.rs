// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! Session cookies are set on login and refresh, and cleared on logout
//! with the same attributes they were created with.

use axum::http::{header, Request, StatusCode};
use axum::body::Body;
use serde_json::json;

mod common;
use common::{find_cookie, json_request, login, register, send, set_cookie_headers};

fn assert_session_attributes(cookie: &str) {
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("Secure"), "{cookie}");
    assert!(cookie.contains("SameSite=Lax"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");
}

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let (app, state) = common::create_test_app();
    register(&app, "alice").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/users/login",
            json!({ "username": "alice", "password": "P@ssw0rd!" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookie_headers(&response);
    let access = find_cookie(&cookies, "accessToken");
    let refresh = find_cookie(&cookies, "refreshToken");

    assert_session_attributes(&access);
    assert_session_attributes(&refresh);
    assert!(access.contains(&format!(
        "Max-Age={}",
        state.config.access_token_ttl_secs
    )));
    assert!(refresh.contains(&format!(
        "Max-Age={}",
        state.config.refresh_token_ttl_secs
    )));

    let body = common::body_json(response).await;
    let token = body["access_token"].as_str().unwrap();
    assert!(access.starts_with(&format!("accessToken={token}")));
}

#[tokio::test]
async fn test_logout_clears_session_cookies() {
    let (app, _) = common::create_test_app();
    register(&app, "bob").await;
    let session = login(&app, "bob").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/users/logout")
        .header(
            header::COOKIE,
            format!(
                "accessToken={}; refreshToken={}",
                session.access_token, session.refresh_token
            ),
        )
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookie_headers(&response);
    for name in ["accessToken", "refreshToken"] {
        let cookie = find_cookie(&cookies, name);
        assert_session_attributes(&cookie);
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
        assert!(cookie.starts_with(&format!("{name}=;")), "{cookie}");
    }
}

#[tokio::test]
async fn test_refresh_replaces_session_cookies() {
    let (app, _) = common::create_test_app();
    register(&app, "carol").await;
    let session = login(&app, "carol").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({ "refresh_token": session.refresh_token }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookie_headers(&response);
    let refresh = find_cookie(&cookies, "refreshToken");
    assert_session_attributes(&refresh);
    assert!(!refresh.contains(&session.refresh_token));
}
