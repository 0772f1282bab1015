//! Read-model aggregator
//!
//! Assembles composite views by joining flat relation records at read
//! time: channel profiles with counts, liked-video and watch-history
//! feeds with nested owner projections, subscriber listings, channel
//! dashboard stats. Every call is a point-in-time snapshot; nothing is
//! cached.

use std::sync::Arc;

use crate::data::{
    ChannelProfile, ChannelStats, Database, SubscriptionEntry, VideoWithOwner,
};
use crate::error::AppError;

use super::{require_text, require_valid_id};

/// Views service
pub struct ViewsService {
    db: Arc<Database>,
}

impl ViewsService {
    /// Create new views service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Channel profile with subscription counts and the viewer's own
    /// subscription edge
    ///
    /// # Errors
    /// `NotFound` - username unknown
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: &str,
    ) -> Result<ChannelProfile, AppError> {
        let username = require_text(username, "username")?.to_lowercase();

        self.db
            .channel_profile(&username, viewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))
    }

    /// Videos the actor has liked, with owner display fields nested
    ///
    /// An actor with zero likes gets an empty sequence, not an error.
    pub async fn liked_videos(&self, actor_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        self.db.liked_videos(actor_id).await
    }

    /// The actor's watch history, most recent first
    pub async fn watch_history(&self, actor_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        self.db.watch_history(actor_id).await
    }

    /// Subscribers of a channel
    pub async fn subscribers_of(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        require_valid_id(channel_id, "channel")?;
        if self.db.get_user(channel_id).await?.is_none() {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        self.db.subscribers_of(channel_id).await
    }

    /// Channels a user is subscribed to
    pub async fn subscriptions_of(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        require_valid_id(subscriber_id, "subscriber")?;
        if self.db.get_user(subscriber_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.db.subscriptions_of(subscriber_id).await
    }

    /// Dashboard aggregate for the actor's own channel
    pub async fn channel_stats(&self, actor_id: &str) -> Result<ChannelStats, AppError> {
        self.db.channel_stats(actor_id).await
    }
}
