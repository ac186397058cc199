// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! [`Db`] is the handle the services hold. It forwards each primitive
//! operation to either Firestore or the in-memory store, and builds the
//! user-record mutations on top of [`Db::modify_user`] so both backends
//! share the same read-modify-write semantics.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Comment, Like, Subscription, User, Video};
use futures_util::{stream, StreamExt};
use uuid::Uuid;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const VIDEOS: &str = "videos";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const LIKES: &str = "likes";
    pub const COMMENTS: &str = "comments";
    /// Uniqueness claims, keyed by username and by email
    pub const USERNAMES: &str = "usernames";
    pub const EMAILS: &str = "emails";
}

/// Handle to the configured document store.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

macro_rules! dispatch {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match $self {
            Db::Firestore(db) => db.$method($($arg),*).await,
            Db::Memory(db) => db.$method($($arg),*).await,
        }
    };
}

impl Db {
    /// Fresh, empty in-memory store.
    pub fn memory() -> Self {
        Db::Memory(MemoryDb::new())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        dispatch!(self.get_user(user_id))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        dispatch!(self.find_user_by_username(username))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        dispatch!(self.find_user_by_email(email))
    }

    /// Insert a new user. Fails with `Conflict` if the username or email is taken.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        dispatch!(self.create_user(user))
    }

    /// Atomically read, mutate and write back a single user record.
    ///
    /// `apply` returns `false` to abandon the write. Returns the stored
    /// record after the write, or `None` if the user does not exist or
    /// `apply` declined. Fails with `Conflict` if a concurrent write to the
    /// same record won.
    pub async fn modify_user<F>(&self, user_id: Uuid, apply: F) -> Result<Option<User>, AppError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        dispatch!(self.modify_user(user_id, apply))
    }

    /// Overwrite (or clear, with `None`) the stored refresh token.
    ///
    /// Returns `false` if the user does not exist.
    pub async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: Option<String>,
    ) -> Result<bool, AppError> {
        let updated = self
            .modify_user(user_id, move |user| {
                user.refresh_token = token;
                user.updated_at = chrono::Utc::now();
                true
            })
            .await?;
        Ok(updated.is_some())
    }

    /// Compare-and-set rotation of the refresh token.
    ///
    /// Writes `new_token` only if the stored token still equals `expected`.
    /// Of two callers presenting the same token, at most one gets `true`;
    /// losing a concurrent write counts as a mismatch.
    pub async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        new_token: String,
    ) -> Result<bool, AppError> {
        let expected = expected.to_string();
        let updated = self
            .modify_user(user_id, move |user| {
                if user.refresh_token.as_deref() != Some(expected.as_str()) {
                    return false;
                }
                user.refresh_token = Some(new_token);
                user.updated_at = chrono::Utc::now();
                true
            })
            .await;

        match updated {
            Ok(user) => Ok(user.is_some()),
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Replace the stored password hash. Returns `false` if the user does not exist.
    pub async fn set_password_hash(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<bool, AppError> {
        let updated = self
            .modify_user(user_id, move |user| {
                user.password_hash = password_hash;
                user.updated_at = chrono::Utc::now();
                true
            })
            .await?;
        Ok(updated.is_some())
    }

    /// Fetch several users, preserving the order of `ids`. Missing users are skipped.
    pub async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let users = stream::iter(ids.iter().copied())
            .map(|id| async move { self.get_user(id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users.into_iter().flatten().collect())
    }

    // ─── Video Operations ────────────────────────────────────────

    pub async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, AppError> {
        dispatch!(self.get_video(video_id))
    }

    pub async fn set_video(&self, video: &Video) -> Result<(), AppError> {
        dispatch!(self.set_video(video))
    }

    /// Fetch several videos, preserving the order of `ids`. Missing videos are skipped.
    pub async fn get_videos(&self, ids: &[Uuid]) -> Result<Vec<Video>, AppError> {
        let videos = stream::iter(ids.iter().copied())
            .map(|id| async move { self.get_video(id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Video>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Video>>, AppError>>()?;

        Ok(videos.into_iter().flatten().collect())
    }

    // ─── Subscription Operations ─────────────────────────────────

    /// Number of edges where `channel_id` is the channel.
    pub async fn count_subscribers(&self, channel_id: Uuid) -> Result<u64, AppError> {
        dispatch!(self.count_subscribers(channel_id))
    }

    /// Number of edges where `subscriber_id` is the subscriber.
    pub async fn count_subscribed_to(&self, subscriber_id: Uuid) -> Result<u64, AppError> {
        dispatch!(self.count_subscribed_to(subscriber_id))
    }

    pub async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        dispatch!(self.find_subscription(subscriber_id, channel_id))
    }

    pub async fn create_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        dispatch!(self.create_subscription(subscription))
    }

    pub async fn delete_subscription(&self, subscription_id: Uuid) -> Result<(), AppError> {
        dispatch!(self.delete_subscription(subscription_id))
    }

    // ─── Like Operations ─────────────────────────────────────────

    /// Insert a like unless one already exists for the pair. Returns `false` on duplicate.
    pub async fn create_like(&self, like: &Like) -> Result<bool, AppError> {
        dispatch!(self.create_like(like))
    }

    /// Delete the like for the pair. Returns `false` if there was none.
    pub async fn delete_like(&self, video_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        dispatch!(self.delete_like(video_id, user_id))
    }

    pub async fn get_likes_for_video(&self, video_id: Uuid) -> Result<Vec<Like>, AppError> {
        dispatch!(self.get_likes_for_video(video_id))
    }

    // ─── Comment Operations ──────────────────────────────────────

    pub async fn create_comment(&self, comment: &Comment) -> Result<(), AppError> {
        dispatch!(self.create_comment(comment))
    }

    pub async fn count_comments(&self, video_id: Uuid) -> Result<u64, AppError> {
        dispatch!(self.count_comments(video_id))
    }

    /// Comments for a video, newest first (ties broken by ID, descending).
    pub async fn get_comments_for_video(
        &self,
        video_id: Uuid,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Comment>, AppError> {
        dispatch!(self.get_comments_for_video(video_id, offset, limit))
    }
}
