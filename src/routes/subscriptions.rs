// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription routes.

use crate::error::Result;
use crate::middleware::auth::{require_auth, AuthUser};
use crate::AppState;
use axum::{
    extract::{Path, State},
    middleware,
    routing::post,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Subscription routes, mounted under `/api/v1/subscriptions`.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/c/{channel_id}", post(toggle_subscription))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionResponse {
    pub channel_id: String,
    pub subscribed: bool,
}

async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> Result<Json<SubscriptionResponse>> {
    let subscribed = state
        .social
        .toggle_subscription(user.user_id, &channel_id)
        .await?;

    Ok(Json(SubscriptionResponse {
        channel_id,
        subscribed,
    }))
}
