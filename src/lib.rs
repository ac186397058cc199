// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vidshare: accounts, sessions and the social graph of a video platform
//!
//! This crate provides the backend API for user registration and
//! token-based sessions, plus channel profiles, watch history, comments,
//! likes and subscriptions.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{PasswordError, PasswordHasher, SessionService, SocialService, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub tokens: Arc<TokenService>,
    pub sessions: SessionService,
    pub social: SocialService,
}

impl AppState {
    /// Wire the services over a document store.
    pub fn new(config: Config, db: Db) -> Result<Self, PasswordError> {
        let hasher = PasswordHasher::from_config(&config)?;
        let tokens = Arc::new(TokenService::from_config(&config));
        let sessions = SessionService::new(db.clone(), hasher, tokens.clone());
        let social = SocialService::new(db.clone());

        Ok(Self {
            config,
            db,
            tokens,
            sessions,
            social,
        })
    }
}
