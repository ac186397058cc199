// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and credential storage)
//! - Videos
//! - Subscriptions, likes and comments (edges between users and videos)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Comment, Like, Subscription, User, Video};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection, FirestoreWritePrecondition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker document reserving a username or email for one user.
#[derive(Debug, Serialize, Deserialize)]
struct Claim {
    user_id: Uuid,
}

/// True when another writer won the document: a failed create
/// precondition, or a transaction aborted by contention.
fn is_contention(err: &FirestoreError) -> bool {
    match err {
        FirestoreError::DataConflictError(_) => true,
        FirestoreError::DatabaseError(e) => {
            matches!(e.public.code.as_str(), "Aborted" | "FailedPrecondition")
        }
        _ => false,
    }
}

fn transaction_error(user_id: Uuid, stage: &str, err: FirestoreError) -> AppError {
    if is_contention(&err) {
        tracing::debug!(
            user_id = %user_id,
            stage,
            error = %err,
            "User transaction lost to a concurrent write"
        );
        AppError::Conflict("User record was modified concurrently".to_string())
    } else {
        AppError::Database(format!("Transaction {} failed: {}", stage, err))
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_field(&self, field: &str, value: &str) -> Result<Option<User>, AppError> {
        let value = value.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_user_by_field("username", username).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_user_by_field("email", email).await
    }

    /// Insert a new user together with its username and email claims.
    ///
    /// All three documents are written in one transaction with a
    /// must-not-exist precondition, so of two registrations racing on the
    /// same username or email only one commits.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let taken =
            || AppError::Conflict("User with username or email already exists".to_string());

        // Fast path for records that predate claim documents
        if self.find_user_by_username(&user.username).await?.is_some()
            || self.find_user_by_email(&user.email).await?.is_some()
        {
            return Err(taken());
        }

        let client = self.get_client()?;
        let claim = Claim { user_id: user.id };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let staged = [
            (collections::USERNAMES, user.username.clone()),
            (collections::EMAILS, user.email.clone()),
        ]
        .into_iter()
        .try_for_each(|(collection, doc_id)| {
            client
                .fluent()
                .update()
                .in_col(collection)
                .precondition(FirestoreWritePrecondition::Exists(false))
                .document_id(doc_id)
                .object(&claim)
                .add_to_transaction(&mut transaction)
                .map(|_| ())
        })
        .and_then(|()| {
            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .precondition(FirestoreWritePrecondition::Exists(false))
                .document_id(user.id.to_string())
                .object(user)
                .add_to_transaction(&mut transaction)
                .map(|_| ())
        });

        if let Err(e) = staged {
            let _ = transaction.rollback().await;
            return Err(AppError::Database(format!(
                "Failed to add user to transaction: {}",
                e
            )));
        }

        match transaction.commit().await {
            Ok(_) => Ok(()),
            Err(e) if is_contention(&e) => {
                tracing::debug!(
                    username = %user.username,
                    error = %e,
                    "Registration lost a claim race"
                );
                Err(taken())
            }
            Err(e) => Err(AppError::Database(format!("Transaction commit failed: {}", e))),
        }
    }

    /// Transactional read-modify-write of one user document.
    ///
    /// The read happens inside the transaction, so a concurrent write to
    /// the same document aborts this one. That outcome is reported as
    /// `Conflict` rather than a database failure.
    pub async fn modify_user<F>(&self, user_id: Uuid, apply: F) -> Result<Option<User>, AppError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let client = self.get_client()?;
        let doc_id = user_id.to_string();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );

        let read: Result<Option<User>, FirestoreError> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&doc_id)
            .await;

        let current = match read {
            Ok(current) => current,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(transaction_error(user_id, "read", e));
            }
        };

        let Some(mut user) = current else {
            let _ = transaction.rollback().await;
            return Ok(None);
        };

        if !apply(&mut user) {
            let _ = transaction.rollback().await;
            return Ok(None);
        }

        let staged = client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&doc_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map(|_| ());

        if let Err(e) = staged {
            let _ = transaction.rollback().await;
            return Err(AppError::Database(format!(
                "Failed to add user to transaction: {}",
                e
            )));
        }

        transaction
            .commit()
            .await
            .map_err(|e| transaction_error(user_id, "commit", e))?;

        Ok(Some(user))
    }

    // ─── Video Operations ────────────────────────────────────────

    pub async fn get_video(&self, video_id: Uuid) -> Result<Option<Video>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::VIDEOS)
            .obj()
            .one(&video_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set_video(&self, video: &Video) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::VIDEOS)
            .document_id(video.id.to_string())
            .object(video)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Subscription Operations ─────────────────────────────────

    async fn subscriptions_where(
        &self,
        field: &'static str,
        user_id: Uuid,
    ) -> Result<Vec<Subscription>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.for_all([q.field(field).eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn count_subscribers(&self, channel_id: Uuid) -> Result<u64, AppError> {
        Ok(self.subscriptions_where("channel_id", channel_id).await?.len() as u64)
    }

    pub async fn count_subscribed_to(&self, subscriber_id: Uuid) -> Result<u64, AppError> {
        Ok(self
            .subscriptions_where("subscriber_id", subscriber_id)
            .await?
            .len() as u64)
    }

    pub async fn find_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let subscriber_id = subscriber_id.to_string();
        let channel_id = channel_id.to_string();
        let found: Vec<Subscription> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("subscriber_id").eq(subscriber_id.clone()),
                    q.field("channel_id").eq(channel_id.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.into_iter().next())
    }

    pub async fn create_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(subscription.id.to_string())
            .object(subscription)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_subscription(&self, subscription_id: Uuid) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SUBSCRIPTIONS)
            .document_id(subscription_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Like Operations ─────────────────────────────────────────

    async fn get_like(&self, doc_id: &str) -> Result<Option<Like>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LIKES)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Like documents are keyed by (video, user), so the insert itself
    /// fails if another request created the same like first.
    pub async fn create_like(&self, like: &Like) -> Result<bool, AppError> {
        let doc_id = Like::doc_id(like.video_id, like.user_id);
        if self.get_like(&doc_id).await?.is_some() {
            return Ok(false);
        }

        let inserted: Result<Like, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::LIKES)
            .document_id(&doc_id)
            .object(like)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    pub async fn delete_like(&self, video_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let doc_id = Like::doc_id(video_id, user_id);
        if self.get_like(&doc_id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LIKES)
            .document_id(&doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    pub async fn get_likes_for_video(&self, video_id: Uuid) -> Result<Vec<Like>, AppError> {
        let video_id = video_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(move |q| q.for_all([q.field("video_id").eq(video_id.clone())]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Comment Operations ──────────────────────────────────────

    pub async fn create_comment(&self, comment: &Comment) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COMMENTS)
            .document_id(comment.id.to_string())
            .object(comment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn count_comments(&self, video_id: Uuid) -> Result<u64, AppError> {
        let video_id = video_id.to_string();
        let comments: Vec<Comment> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| q.for_all([q.field("video_id").eq(video_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(comments.len() as u64)
    }

    pub async fn get_comments_for_video(
        &self,
        video_id: Uuid,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Comment>, AppError> {
        let video_id = video_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| q.for_all([q.field("video_id").eq(video_id.clone())]))
            .order_by([
                ("created_at", FirestoreQueryDirection::Descending),
                ("id", FirestoreQueryDirection::Descending),
            ])
            .offset(offset)
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
