// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Backs local runs and the test suite. Each collection is a `DashMap`;
//! single-record read-modify-write happens under the map's entry lock,
//! which is what makes refresh-token rotation compare-and-set.

use crate::error::AppError;
use crate::models::{Comment, Like, Subscription, User, Video};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: DashMap<Uuid, User>,
    videos: DashMap<Uuid, Video>,
    subscriptions: DashMap<Uuid, Subscription>,
    /// Keyed by `Like::doc_id`
    likes: DashMap<String, Like>,
    comments: DashMap<Uuid, Comment>,
    /// Serializes user creation so the uniqueness check and insert are one step.
    user_create_lock: Mutex<()>,
}

/// In-memory document store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Collections>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.users.get(&user_id).map(|u| u.clone()))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .inner
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .inner
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone()))
    }

    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let _guard = self
            .inner
            .user_create_lock
            .lock()
            .map_err(|_| AppError::Database("user store lock poisoned".to_string()))?;

        let taken = self
            .inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(AppError::Conflict(
                "User with username or email already exists".to_string(),
            ));
        }

        self.inner.users.insert(user.id, user.clone());
        Ok(())
    }

    pub async fn modify_user<F>(&self, user_id: Uuid, apply: F) -> Result<Option<User>, AppError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let Some(mut entry) = self.inner.users.get_mut(&user_id) else {
            return Ok(None);
        };

        // Mutate a copy so a declined update leaves the record untouched.
        let mut user = entry.clone();
        if !apply(&mut user) {
            return Ok(None);
        }
        *entry = user.clone();
        Ok(Some(user))
    }

    // ─── Video Operations ────────────────────────────────────────

    pub async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.inner.videos.get(&video_id).map(|v| v.clone()))
    }

    pub async fn set_video(&self, video: &Video) -> Result<(), AppError> {
        self.inner.videos.insert(video.id, video.clone());
        Ok(())
    }

    // ─── Subscription Operations ─────────────────────────────────

    pub async fn count_subscribers(&self, channel_id: Uuid) -> Result<u64, AppError> {
        Ok(self
            .inner
            .subscriptions
            .iter()
            .filter(|s| s.channel_id == channel_id)
            .count() as u64)
    }

    pub async fn count_subscribed_to(&self, subscriber_id: Uuid) -> Result<u64, AppError> {
        Ok(self
            .inner
            .subscriptions
            .iter()
            .filter(|s| s.subscriber_id == subscriber_id)
            .count() as u64)
    }

    pub async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        Ok(self
            .inner
            .subscriptions
            .iter()
            .find(|s| s.subscriber_id == subscriber_id && s.channel_id == channel_id)
            .map(|s| s.clone()))
    }

    pub async fn create_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.inner
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    pub async fn delete_subscription(&self, subscription_id: Uuid) -> Result<(), AppError> {
        self.inner.subscriptions.remove(&subscription_id);
        Ok(())
    }

    // ─── Like Operations ─────────────────────────────────────────

    pub async fn create_like(&self, like: &Like) -> Result<bool, AppError> {
        use dashmap::mapref::entry::Entry;

        match self
            .inner
            .likes
            .entry(Like::doc_id(like.video_id, like.user_id))
        {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(like.clone());
                Ok(true)
            }
        }
    }

    pub async fn delete_like(&self, video_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .inner
            .likes
            .remove(&Like::doc_id(video_id, user_id))
            .is_some())
    }

    pub async fn get_likes_for_video(&self, video_id: Uuid) -> Result<Vec<Like>, AppError> {
        let mut likes: Vec<Like> = self
            .inner
            .likes
            .iter()
            .filter(|l| l.video_id == video_id)
            .map(|l| l.clone())
            .collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(likes)
    }

    // ─── Comment Operations ──────────────────────────────────────

    pub async fn create_comment(&self, comment: &Comment) -> Result<(), AppError> {
        self.inner.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    pub async fn count_comments(&self, video_id: Uuid) -> Result<u64, AppError> {
        Ok(self
            .inner
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .count() as u64)
    }

    pub async fn get_comments_for_video(
        &self,
        video_id: Uuid,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Comment>, AppError> {
        let mut comments: Vec<Comment> = self
            .inner
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .map(|c| c.clone())
            .collect();

        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(comments
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}
