// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Video model plus the like and comment records hanging off it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored video record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Video ID (also used as document ID)
    pub id: Uuid,
    /// Owning user
    pub owner_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Object storage URL of the video file
    pub video_file: String,
    /// Object storage URL of the thumbnail
    pub thumbnail: String,
    /// Duration in seconds
    pub duration_secs: f64,
    #[serde(default)]
    pub views: u64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// A user's like on a video. At most one per (video, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub video_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(video_id: Uuid, user_id: Uuid) -> Self {
        Self {
            video_id,
            user_id,
            created_at: Utc::now(),
        }
    }

    /// Document ID: one document per (video, user) pair.
    pub fn doc_id(video_id: Uuid, user_id: Uuid) -> String {
        format!("{}_{}", video_id, user_id)
    }
}

/// Comment on a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Comment ID (also used as document ID)
    pub id: Uuid,
    pub video_id: Uuid,
    /// Author
    pub user_id: Uuid,
    pub content: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}
