//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Check whether a string is a syntactically valid entity ID
    ///
    /// Every resource ID in path parameters is validated with this
    /// before hitting the database.
    pub fn is_valid(s: &str) -> bool {
        ulid::Ulid::from_string(s).is_ok()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user, also a "channel" others can subscribe to
///
/// `password_hash` and `refresh_token` never leave the data layer;
/// API responses use [`UserProfile`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Lowercased, unique
    pub username: String,
    /// Unique
    pub email: String,
    pub full_name: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// Public URL of the avatar image (mandatory at registration)
    pub avatar_url: String,
    /// Blob-store key of the avatar
    pub avatar_key: String,
    /// Public URL of the cover image (optional)
    pub cover_url: Option<String>,
    pub cover_key: Option<String>,
    /// Single current refresh-token slot; None when logged out.
    /// Overwritten on login and rotation, so a user has at most one
    /// valid refresh token system-wide.
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display-safe projection of a user
///
/// This is the only user shape serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Video
// =============================================================================

/// An uploaded video
///
/// `owner_id` is set at creation and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    /// Public URL of the video file
    pub video_url: String,
    /// Blob-store key of the video file
    pub video_key: String,
    pub thumbnail_url: String,
    pub thumbnail_key: String,
    /// Duration reported by the blob store at upload time
    pub duration_seconds: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Comment
// =============================================================================

/// A comment on a video
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub owner_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Playlist
// =============================================================================

/// A named, user-owned collection of videos
///
/// Membership is a set (no duplicates), held in `playlist_videos`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Relations
// =============================================================================

/// What a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video,
    Comment,
}

impl LikeTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
        }
    }
}

/// Like relationship: (actor, target, kind), at most one per tuple
///
/// The at-most-one invariant is enforced by a UNIQUE index on
/// (user_id, target_id, target_kind).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub target_id: String,
    /// "video" or "comment"
    pub target_kind: String,
    pub created_at: DateTime<Utc>,
}

/// Subscription relationship: subscriber follows channel
///
/// At most one per (subscriber, channel), enforced by a UNIQUE index.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a relation toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Added,
    Removed,
}

impl ToggleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

// =============================================================================
// Read-model projections
// =============================================================================

/// Minimal owner projection nested in video feeds
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRef {
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A video joined with its owner's display fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: OwnerRef,
}

/// Channel profile aggregate: user fields plus subscription counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub user: UserProfile,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// One row of a subscriber/subscription listing: the relation id plus
/// the counterpart user's public fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

/// Channel dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}
