// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes.
//!
//! Login and refresh deliver tokens both in the JSON body and as
//! `accessToken` / `refreshToken` cookies; logout clears the cookies.

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    optional_auth, require_auth, AuthUser, MaybeAuthUser, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::models::PublicUser;
use crate::services::session::{Registration, TokenPair};
use crate::services::social::{ChannelProfile, WatchedVideo};
use crate::services::tokens::TokenType;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User routes, mounted under `/api/v1/users`.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token));

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/history", get(watch_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let optional = Router::new()
        .route("/channel/{username}", get(channel_profile))
        .route_layer(middleware::from_fn_with_state(state, optional_auth));

    Router::new().merge(public).merge(protected).merge(optional)
}

// ─── Cookies ─────────────────────────────────────────────────

fn token_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

fn with_session_cookies(jar: CookieJar, state: &AppState, tokens: &TokenPair) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        tokens.access_token.clone(),
        state.tokens.ttl_secs(TokenType::Access),
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token.clone(),
        state.tokens.ttl_secs(TokenType::Refresh),
    ))
}

// Cleared cookies keep the attributes they were set with.
fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.add(token_cookie(ACCESS_TOKEN_COOKIE, String::new(), 0))
        .add(token_cookie(REFRESH_TOKEN_COOKIE, String::new(), 0))
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokensResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

// ─── Registration & Login ────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct RegisterRequest {
    full_name: String,
    email: String,
    username: String,
    password: String,
    /// URL returned by object storage
    avatar: Option<String>,
    cover_image: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<PublicUser>)> {
    let user = state
        .sessions
        .register(Registration {
            full_name: body.full_name,
            email: body.email,
            username: body.username,
            password: body.password,
            avatar: body.avatar,
            cover_image: body.cover_image,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let outcome = state
        .sessions
        .login(
            body.username.as_deref(),
            body.email.as_deref(),
            &body.password,
        )
        .await?;

    let jar = with_session_cookies(jar, &state, &outcome.tokens);
    Ok((
        jar,
        Json(LoginResponse {
            user: outcome.user,
            access_token: outcome.tokens.access_token,
            refresh_token: outcome.tokens.refresh_token,
        }),
    ))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    state.sessions.logout(user.user_id).await?;
    Ok((
        without_session_cookies(jar),
        MessageResponse::ok("User logged out"),
    ))
}

// ─── Token Refresh ───────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct RefreshRequest {
    #[serde(alias = "refreshToken")]
    refresh_token: Option<String>,
}

/// Rotate the refresh token. The cookie wins over the body.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<TokensResponse>)> {
    // The body is optional, so an empty or non-JSON body is not an error.
    let incoming = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .ok()
                .and_then(|b| b.refresh_token)
        });

    let pair = state.sessions.refresh(incoming.as_deref()).await?;

    let jar = with_session_cookies(jar, &state, &pair);
    Ok((jar, Json(TokensResponse::from(pair))))
}

// ─── Account ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<ChangePasswordRequest>, AppError>,
) -> Result<Json<MessageResponse>> {
    state
        .sessions
        .change_password(user.user_id, &body.old_password, &body.new_password)
        .await?;
    Ok(MessageResponse::ok("Password changed successfully"))
}

async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    Ok(Json(state.sessions.current_user(user.user_id).await?))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UpdateAccountRequest {
    full_name: String,
    email: String,
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateAccountRequest>, AppError>,
) -> Result<Json<PublicUser>> {
    let updated = state
        .sessions
        .update_account(user.user_id, &body.full_name, &body.email)
        .await?;
    Ok(Json(updated))
}

// ─── Channel & History ───────────────────────────────────────

async fn channel_profile(
    State(state): State<Arc<AppState>>,
    Extension(MaybeAuthUser(requester)): Extension<MaybeAuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ChannelProfile>> {
    let profile = state
        .social
        .channel_profile(&username, requester.map(|u| u.user_id))
        .await?;
    Ok(Json(profile))
}

async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<WatchedVideo>>> {
    Ok(Json(state.social.watch_history(user.user_id).await?))
}
