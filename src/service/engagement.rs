//! Relation toggle engine
//!
//! Generic create-or-remove logic for "did actor X act on target Y"
//! relations: likes on videos and comments, subscriptions to channels.
//!
//! Lookups always key on (actor, target, kind) — never the target
//! alone — so one user's toggle can never affect another user's
//! relation. Inserts are conditioned on the store's compound unique
//! key, so two concurrent identical toggles leave exactly one row.

use std::sync::Arc;

use crate::data::{Database, LikeTarget, ToggleState};
use crate::error::AppError;

use super::require_valid_id;

/// Engagement service
pub struct EngagementService {
    db: Arc<Database>,
}

impl EngagementService {
    /// Create new engagement service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Toggle a like on a video
    ///
    /// # Errors
    /// * `Validation` - malformed video ID
    /// * `NotFound` - video does not exist
    pub async fn toggle_video_like(
        &self,
        actor_id: &str,
        video_id: &str,
    ) -> Result<ToggleState, AppError> {
        require_valid_id(video_id, "video")?;
        if self.db.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        self.toggle_like(actor_id, video_id, LikeTarget::Video).await
    }

    /// Toggle a like on a comment
    pub async fn toggle_comment_like(
        &self,
        actor_id: &str,
        comment_id: &str,
    ) -> Result<ToggleState, AppError> {
        require_valid_id(comment_id, "comment")?;
        if self.db.get_comment(comment_id).await?.is_none() {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        self.toggle_like(actor_id, comment_id, LikeTarget::Comment)
            .await
    }

    /// Toggle a subscription to a channel
    ///
    /// Channel existence is checked via user lookup. Self-subscription
    /// is not rejected; the unique index still caps it at one row.
    pub async fn toggle_subscription(
        &self,
        actor_id: &str,
        channel_id: &str,
    ) -> Result<ToggleState, AppError> {
        require_valid_id(channel_id, "channel")?;
        if self.db.get_user(channel_id).await?.is_none() {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        let state = if self
            .db
            .get_subscription(actor_id, channel_id)
            .await?
            .is_none()
        {
            // Conditional insert on (subscriber, channel); a losing
            // race still leaves the relation present.
            self.db
                .insert_subscription_if_absent(actor_id, channel_id)
                .await?;
            ToggleState::Added
        } else {
            self.db.delete_subscription(actor_id, channel_id).await?;
            ToggleState::Removed
        };

        crate::metrics::RELATION_TOGGLES_TOTAL
            .with_label_values(&["subscription", state.as_str()])
            .inc();

        Ok(state)
    }

    /// Shared like-toggle core, keyed on (actor, target, kind)
    async fn toggle_like(
        &self,
        actor_id: &str,
        target_id: &str,
        kind: LikeTarget,
    ) -> Result<ToggleState, AppError> {
        let state = if self.db.get_like(actor_id, target_id, kind).await?.is_none() {
            self.db
                .insert_like_if_absent(actor_id, target_id, kind)
                .await?;
            ToggleState::Added
        } else {
            self.db.delete_like(actor_id, target_id, kind).await?;
            ToggleState::Removed
        };

        crate::metrics::RELATION_TOGGLES_TOTAL
            .with_label_values(&[kind.as_str(), state.as_str()])
            .inc();

        Ok(state)
    }
}
