// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social graph queries and edges: channel profiles, watch history,
//! comments, likes and subscriptions.
//!
//! Read paths join users, videos and edges in application code and never
//! write. The edge operations (like, unlike, subscribe toggle, comment)
//! are plain inserts and deletes.

use std::collections::HashMap;

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{Comment, Like, OwnerProfile, Subscription, User, Video};
use crate::time_utils::format_utc_rfc3339;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Parse a path identifier, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {} ID", what)))
}

/// Public channel page for a user.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChannelProfile {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: u64,
    pub channels_subscribed_to_count: u64,
    /// Whether the requesting user subscribes to this channel
    pub is_subscribed: bool,
}

/// Video entry in a watch history, with its owner projected.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WatchedVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration_secs: f64,
    pub views: u64,
    pub created_at: String,
    pub owner: Option<OwnerProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentView {
    pub id: Uuid,
    pub video_id: Uuid,
    pub content: String,
    pub created_at: String,
    pub author: Option<OwnerProfile>,
}

/// One page of comments plus the total for the video.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// A user who liked a video.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Liker {
    pub user_id: Uuid,
    pub liked_at: String,
    pub profile: Option<OwnerProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeView {
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub created_at: String,
}

impl From<&Like> for LikeView {
    fn from(like: &Like) -> Self {
        Self {
            video_id: like.video_id,
            user_id: like.user_id,
            created_at: format_utc_rfc3339(like.created_at),
        }
    }
}

#[derive(Clone)]
pub struct SocialService {
    db: Db,
}

/// Look up profiles for a set of user IDs, keyed by ID.
async fn profiles_by_id(db: &Db, ids: impl Iterator<Item = Uuid>) -> Result<HashMap<Uuid, OwnerProfile>> {
    let mut unique: Vec<Uuid> = ids.collect();
    unique.sort();
    unique.dedup();

    let users: Vec<User> = db.get_users(&unique).await?;
    Ok(users
        .iter()
        .map(|u| (u.id, OwnerProfile::from(u)))
        .collect())
}

impl SocialService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    async fn require_video(&self, video_id: Uuid) -> Result<Video> {
        self.db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    // ─── Channel Profile ─────────────────────────────────────────

    /// Channel page for `username`, with subscription counts and whether
    /// `requester` (if any) subscribes to it.
    pub async fn channel_profile(
        &self,
        username: &str,
        requester: Option<Uuid>,
    ) -> Result<ChannelProfile> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::validation("username is missing"));
        }

        let channel = self
            .db
            .find_user_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;

        let channel_id = channel.id;
        let is_subscribed = async {
            match requester {
                Some(requester) => self
                    .db
                    .find_subscription(requester, channel_id)
                    .await
                    .map(|edge| edge.is_some()),
                None => Ok(false),
            }
        };

        let (subscribers_count, channels_subscribed_to_count, is_subscribed) = tokio::try_join!(
            self.db.count_subscribers(channel_id),
            self.db.count_subscribed_to(channel_id),
            is_subscribed,
        )?;

        Ok(ChannelProfile {
            id: channel.id,
            full_name: channel.full_name,
            username: channel.username,
            email: channel.email,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        })
    }

    // ─── Watch History ───────────────────────────────────────────

    /// Videos in the user's stored history order, each with its owner.
    /// IDs whose video no longer exists are dropped.
    pub async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchedVideo>> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        let videos = self.db.get_videos(&user.watch_history).await?;
        let owners = profiles_by_id(&self.db, videos.iter().map(|v| v.owner_id)).await?;

        Ok(videos
            .into_iter()
            .map(|v| WatchedVideo {
                owner: owners.get(&v.owner_id).cloned(),
                id: v.id,
                title: v.title,
                description: v.description,
                video_file: v.video_file,
                thumbnail: v.thumbnail,
                duration_secs: v.duration_secs,
                views: v.views,
                created_at: format_utc_rfc3339(v.created_at),
            })
            .collect())
    }

    // ─── Comments ────────────────────────────────────────────────

    /// One page of a video's comments, newest first.
    pub async fn video_comments(&self, video_id: &str, page: u32, limit: u32) -> Result<CommentPage> {
        let video_id = parse_id(video_id, "video")?;

        if page < 1 {
            return Err(AppError::validation("Page must be greater than 0"));
        }
        if limit < 1 {
            return Err(AppError::validation("Limit must be greater than 0"));
        }
        let limit = limit.min(MAX_LIMIT);
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::validation("Page number causes overflow"))?;

        let (total, comments) = tokio::try_join!(
            self.db.count_comments(video_id),
            self.db.get_comments_for_video(video_id, offset, limit),
        )?;

        let authors = profiles_by_id(&self.db, comments.iter().map(|c| c.user_id)).await?;

        let comments = comments
            .into_iter()
            .map(|c| CommentView {
                author: authors.get(&c.user_id).cloned(),
                id: c.id,
                video_id: c.video_id,
                content: c.content,
                created_at: format_utc_rfc3339(c.created_at),
            })
            .collect();

        Ok(CommentPage {
            comments,
            total,
            page,
            limit,
        })
    }

    pub async fn add_comment(&self, video_id: &str, user_id: Uuid, content: &str) -> Result<CommentView> {
        let video_id = parse_id(video_id, "video")?;
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment content is required"));
        }
        self.require_video(video_id).await?;

        let comment = Comment {
            id: Uuid::new_v4(),
            video_id,
            user_id,
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.db.create_comment(&comment).await?;

        let author = self.db.get_user(user_id).await?.map(|u| OwnerProfile::from(&u));
        Ok(CommentView {
            id: comment.id,
            video_id,
            content: comment.content,
            created_at: format_utc_rfc3339(comment.created_at),
            author,
        })
    }

    // ─── Likes ───────────────────────────────────────────────────

    pub async fn like(&self, video_id: &str, user_id: Uuid) -> Result<LikeView> {
        let video_id = parse_id(video_id, "video")?;
        self.require_video(video_id).await?;

        let like = Like::new(video_id, user_id);
        if !self.db.create_like(&like).await? {
            return Err(AppError::Conflict(
                "You have already liked this video".to_string(),
            ));
        }

        tracing::debug!(video_id = %video_id, user_id = %user_id, "Video liked");
        Ok(LikeView::from(&like))
    }

    pub async fn unlike(&self, video_id: &str, user_id: Uuid) -> Result<()> {
        let video_id = parse_id(video_id, "video")?;
        if !self.db.delete_like(video_id, user_id).await? {
            return Err(AppError::NotFound("Like not found".to_string()));
        }

        tracing::debug!(video_id = %video_id, user_id = %user_id, "Video unliked");
        Ok(())
    }

    /// Users who liked a video, most recent first.
    pub async fn video_likes(&self, video_id: &str) -> Result<Vec<Liker>> {
        let video_id = parse_id(video_id, "video")?;
        let likes = self.db.get_likes_for_video(video_id).await?;
        let profiles = profiles_by_id(&self.db, likes.iter().map(|l| l.user_id)).await?;

        Ok(likes
            .iter()
            .map(|l| Liker {
                user_id: l.user_id,
                liked_at: format_utc_rfc3339(l.created_at),
                profile: profiles.get(&l.user_id).cloned(),
            })
            .collect())
    }

    // ─── Subscriptions ───────────────────────────────────────────

    /// Subscribe if not subscribed, unsubscribe otherwise.
    /// Returns whether the subscriber is subscribed afterwards.
    pub async fn toggle_subscription(&self, subscriber_id: Uuid, channel_id: &str) -> Result<bool> {
        let channel_id = parse_id(channel_id, "channel")?;
        if channel_id == subscriber_id {
            return Err(AppError::validation("Cannot subscribe to your own channel"));
        }

        if self.db.get_user(channel_id).await?.is_none() {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        match self.db.find_subscription(subscriber_id, channel_id).await? {
            Some(existing) => {
                self.db.delete_subscription(existing.id).await?;
                tracing::debug!(subscriber = %subscriber_id, channel = %channel_id, "Unsubscribed");
                Ok(false)
            }
            None => {
                self.db
                    .create_subscription(&Subscription::new(subscriber_id, channel_id))
                    .await?;
                tracing::debug!(subscriber = %subscriber_id, channel = %channel_id, "Subscribed");
                Ok(true)
            }
        }
    }
}
