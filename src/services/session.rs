// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: registration, login, logout, token refresh and
//! password change.
//!
//! The user record holds at most one refresh token. Login overwrites it,
//! logout clears it, and refresh swaps it with a compare-and-set, so a
//! refresh token stops working as soon as a newer one has been issued.

use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{PublicUser, User};
use crate::services::password::PasswordHasher;
use crate::services::tokens::{TokenService, TokenType};

const TOKEN_GENERATION_FAILED: &str =
    "Something went wrong while generating access and refresh token";
const REFRESH_TOKEN_REUSED: &str = "Refresh token is expired or used";

/// Registration input. The avatar and cover image are URLs already
/// produced by object storage.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Orchestrates credential checks and token rotation against the store.
#[derive(Clone)]
pub struct SessionService {
    db: Db,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn tokens_match(presented: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => presented.as_bytes().ct_eq(stored.as_bytes()).into(),
        None => false,
    }
}

impl SessionService {
    pub fn new(db: Db, hasher: PasswordHasher, tokens: Arc<TokenService>) -> Self {
        Self { db, hasher, tokens }
    }

    /// Create an account. The stored record holds only the password hash.
    pub async fn register(&self, input: Registration) -> Result<PublicUser> {
        if [
            &input.full_name,
            &input.email,
            &input.username,
            &input.password,
        ]
        .iter()
        .any(|field| is_blank(field))
        {
            return Err(AppError::validation("All fields are required"));
        }

        let username = normalize(&input.username);
        let email = normalize(&input.email);

        if self.db.find_user_by_username(&username).await?.is_some()
            || self.db.find_user_by_email(&email).await?.is_some()
        {
            return Err(AppError::Conflict(
                "User with username or email already exists".to_string(),
            ));
        }

        let avatar = input
            .avatar
            .filter(|url| !is_blank(url))
            .ok_or_else(|| AppError::validation("Avatar file is required"))?;

        let password_hash = self.hasher.hash(&input.password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username,
            email,
            full_name: input.full_name.trim().to_string(),
            password_hash,
            avatar,
            cover_image: input.cover_image.filter(|url| !is_blank(url)),
            watch_history: Vec::new(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        self.db.create_user(&user).await?;

        let created = self.db.get_user(user.id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Something went wrong while registering the user"
            ))
        })?;

        tracing::info!(user_id = %created.id, username = %created.username, "User registered");
        Ok(PublicUser::from(&created))
    }

    /// Sign a new access/refresh pair. Failures surface as a generic internal error.
    fn generate_pair(&self, user: &User) -> Result<TokenPair> {
        let generate = || -> anyhow::Result<TokenPair> {
            Ok(TokenPair {
                access_token: self.tokens.issue_access_token(user)?,
                refresh_token: self.tokens.issue_refresh_token(user.id)?,
            })
        };

        generate().map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Token generation failed");
            AppError::Internal(anyhow::anyhow!(TOKEN_GENERATION_FAILED))
        })
    }

    /// Issue a new token pair and make its refresh token the only valid one.
    async fn issue_session(&self, user: &User) -> Result<TokenPair> {
        let pair = self.generate_pair(user)?;

        let stored = self
            .db
            .set_refresh_token(user.id, Some(pair.refresh_token.clone()))
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to persist refresh token");
                AppError::Internal(anyhow::anyhow!(TOKEN_GENERATION_FAILED))
            })?;

        if !stored {
            return Err(AppError::Internal(anyhow::anyhow!(TOKEN_GENERATION_FAILED)));
        }

        Ok(pair)
    }

    /// Authenticate by username or email plus password.
    pub async fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<LoginOutcome> {
        let username = username.filter(|u| !is_blank(u)).map(normalize);
        let email = email.filter(|e| !is_blank(e)).map(normalize);

        if username.is_none() && email.is_none() {
            return Err(AppError::validation("username or email is required"));
        }

        let mut user = None;
        if let Some(username) = &username {
            user = self.db.find_user_by_username(username).await?;
        }
        if user.is_none() {
            if let Some(email) = &email {
                user = self.db.find_user_by_email(email).await?;
            }
        }
        let user = user.ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !self.hasher.verify(password, &user.password_hash).await {
            tracing::warn!(user_id = %user.id, "Login rejected: bad password");
            return Err(AppError::unauthorized("Invalid user credentials"));
        }

        let tokens = self.issue_session(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user: PublicUser::from(&user),
            tokens,
        })
    }

    /// Forget the user's refresh token. Safe to call when already logged out.
    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        let found = self.db.set_refresh_token(user_id, None).await?;
        if !found {
            tracing::warn!(user_id = %user_id, "Logout for unknown user");
        } else {
            tracing::info!(user_id = %user_id, "User logged out");
        }
        Ok(())
    }

    /// Exchange the current refresh token for a new pair.
    ///
    /// A token that verifies but is no longer the stored one (rotated by a
    /// later login or refresh, or cleared by logout) is rejected.
    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair> {
        let incoming = incoming
            .filter(|t| !is_blank(t))
            .ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;

        let claims = self.tokens.verify(incoming, TokenType::Refresh)?;
        let user_id = claims.user_id()?;

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        if !tokens_match(incoming, user.refresh_token.as_deref()) {
            tracing::warn!(user_id = %user_id, "Rejected stale refresh token");
            return Err(AppError::unauthorized(REFRESH_TOKEN_REUSED));
        }

        let pair = self.generate_pair(&user)?;

        // Another request may have rotated the token since we read it.
        let rotated = self
            .db
            .rotate_refresh_token(user_id, incoming, pair.refresh_token.clone())
            .await?;
        if !rotated {
            tracing::warn!(user_id = %user_id, "Refresh lost rotation race");
            return Err(AppError::unauthorized(REFRESH_TOKEN_REUSED));
        }

        tracing::info!(user_id = %user_id, "Refresh token rotated");
        Ok(pair)
    }

    /// Replace the password after checking the current one.
    ///
    /// The stored refresh token is left in place.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if current_password.is_empty() || is_blank(new_password) {
            return Err(AppError::validation(
                "Current and new password are required",
            ));
        }

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !self.hasher.verify(current_password, &user.password_hash).await {
            return Err(AppError::unauthorized("Invalid old password"));
        }

        let password_hash = self.hasher.hash(new_password).await?;
        if !self.db.set_password_hash(user_id, password_hash).await? {
            return Err(AppError::NotFound("User does not exist".to_string()));
        }

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        Ok(PublicUser::from(&user))
    }

    /// Update display name and email.
    pub async fn update_account(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<PublicUser> {
        if is_blank(full_name) || is_blank(email) {
            return Err(AppError::validation("All fields are required"));
        }

        let full_name = full_name.trim().to_string();
        let email = normalize(email);

        if let Some(owner) = self.db.find_user_by_email(&email).await? {
            if owner.id != user_id {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        let updated = self
            .db
            .modify_user(user_id, move |user| {
                user.full_name = full_name;
                user.email = email;
                user.updated_at = Utc::now();
                true
            })
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        Ok(PublicUser::from(&updated))
    }
}
