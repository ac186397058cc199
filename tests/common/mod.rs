// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use vidshare_api::config::Config;
use vidshare_api::db::{Db, FirestoreDb};
use vidshare_api::models::Video;
use vidshare_api::routes::create_router;
use vidshare_api::AppState;

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

/// Create a test app over a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(Db::memory())
}

#[allow(dead_code)]
pub fn create_test_app_with_db(db: Db) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(
        AppState::new(Config::test_default(), db).expect("Failed to build test state"),
    );
    (create_router(state.clone()), state)
}

/// Build a JSON request, optionally authenticated with a Bearer token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a body-less request, optionally authenticated with a Bearer token.
#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a request through a clone of the router.
#[allow(dead_code)]
pub async fn send(app: &axum::Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Register a user with a default password and avatar; returns the user ID.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, username: &str) -> Uuid {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/users/register",
            json!({
                "full_name": format!("{username} Example"),
                "email": format!("{username}@x.com"),
                "username": username,
                "password": "P@ssw0rd!",
                "avatar": "https://cdn.example.com/avatar.png",
            }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// Tokens returned by a successful login.
#[allow(dead_code)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

#[allow(dead_code)]
pub async fn login(app: &axum::Router, username: &str) -> Session {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/users/login",
            json!({ "username": username, "password": "P@ssw0rd!" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    Session {
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Store a published video owned by `owner_id`.
#[allow(dead_code)]
pub async fn seed_video(state: &AppState, owner_id: Uuid, title: &str) -> Video {
    let video = Video {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        description: String::new(),
        video_file: format!("https://cdn.example.com/{title}.mp4"),
        thumbnail: format!("https://cdn.example.com/{title}.jpg"),
        duration_secs: 42.0,
        views: 0,
        is_published: true,
        created_at: Utc::now(),
    };
    state.db.set_video(&video).await.unwrap();
    video
}

/// Collect `Set-Cookie` header values.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}
