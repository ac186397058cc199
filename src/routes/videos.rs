// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-video social routes: comments and likes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::services::social::{CommentPage, CommentView, LikeView, Liker, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Video routes, mounted under `/api/v1/videos`.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let auth = middleware::from_fn_with_state(state, require_auth);

    // Reading comments is public; posting one needs a session.
    Router::new()
        .route(
            "/{video_id}/comments",
            get(get_comments).merge(post(add_comment).route_layer(auth.clone())),
        )
        .route("/{video_id}/likes", get(get_likes))
        .route(
            "/{video_id}/like",
            post(like_video).delete(unlike_video).route_layer(auth),
        )
}

// ─── Comments ────────────────────────────────────────────────

#[derive(Deserialize)]
struct CommentsQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

async fn get_comments(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<CommentsQuery>, AppError>,
) -> Result<Json<CommentPage>> {
    let page = state
        .social
        .video_comments(&video_id, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AddCommentRequest {
    content: String,
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<AddCommentRequest>, AppError>,
) -> Result<(StatusCode, Json<CommentView>)> {
    let comment = state
        .social
        .add_comment(&video_id, user.user_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Likes ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikesResponse {
    pub total: usize,
    pub likes: Vec<Liker>,
}

async fn get_likes(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<LikesResponse>> {
    let likes = state.social.video_likes(&video_id).await?;
    Ok(Json(LikesResponse {
        total: likes.len(),
        likes,
    }))
}

async fn like_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> Result<(StatusCode, Json<LikeView>)> {
    let like = state.social.like(&video_id, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

async fn unlike_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> Result<StatusCode> {
    state.social.unlike(&video_id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
