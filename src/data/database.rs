//! SQLite database operations
//!
//! All database access goes through this module. The store enforces
//! the relation uniqueness invariants (UNIQUE indexes) and the
//! compare-and-set refresh-token rotation, so concurrent duplicate
//! requests cannot violate the at-most-one-relation-per-pair contract.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
///
/// Components receive this explicitly (no ambient singleton), so tests
/// can point it at a throwaway file database.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Video row joined with its owner's display columns
#[derive(sqlx::FromRow)]
struct VideoOwnerRow {
    id: String,
    owner_id: String,
    title: String,
    description: String,
    video_url: String,
    video_key: String,
    thumbnail_url: String,
    thumbnail_key: String,
    duration_seconds: f64,
    views: i64,
    is_published: bool,
    created_at: chrono::DateTime<Utc>,
    owner_username: String,
    owner_full_name: String,
    owner_avatar_url: String,
}

impl VideoOwnerRow {
    fn into_video_with_owner(self, include_avatar: bool) -> VideoWithOwner {
        VideoWithOwner {
            video: Video {
                id: self.id,
                owner_id: self.owner_id,
                title: self.title,
                description: self.description,
                video_url: self.video_url,
                video_key: self.video_key,
                thumbnail_url: self.thumbnail_url,
                thumbnail_key: self.thumbnail_key,
                duration_seconds: self.duration_seconds,
                views: self.views,
                is_published: self.is_published,
                created_at: self.created_at,
            },
            owner: OwnerRef {
                username: self.owner_username,
                full_name: self.owner_full_name,
                avatar_url: include_avatar.then_some(self.owner_avatar_url),
            },
        }
    }
}

const VIDEO_OWNER_COLUMNS: &str = "v.id, v.owner_id, v.title, v.description, v.video_url, \
     v.video_key, v.thumbnail_url, v.thumbnail_key, v.duration_seconds, v.views, \
     v.is_published, v.created_at, \
     u.username AS owner_username, u.full_name AS owner_full_name, \
     u.avatar_url AS owner_avatar_url";

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// Returns `Conflict` if the username or email is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, password_hash, avatar_url, \
             avatar_key, cover_url, cover_key, refresh_token, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.avatar_key)
        .bind(&user.cover_url)
        .bind(&user.cover_key)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User with email or username already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up a user by username or email (login identity)
    pub async fn get_user_by_identity(&self, identity: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? OR email = ?")
                .bind(identity)
                .bind(identity)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username = ? OR email = ?",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Overwrite the refresh-token slot (login issues a fresh session,
    /// invalidating any previous one)
    pub async fn set_refresh_token(&self, user_id: &str, token: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Rotate the refresh token with compare-and-set semantics.
    ///
    /// The write is conditioned on the previously presented value, so a
    /// concurrent rotation (or a replayed superseded token) observes
    /// zero affected rows instead of blindly overwriting.
    ///
    /// # Returns
    /// `true` if the stored value matched `previous` and was replaced.
    pub async fn rotate_refresh_token(
        &self,
        user_id: &str,
        previous: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, updated_at = ? \
             WHERE id = ? AND refresh_token = ?",
        )
        .bind(next)
        .bind(Utc::now())
        .bind(user_id)
        .bind(previous)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Clear the refresh-token slot unconditionally (logout)
    pub async fn clear_refresh_token(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_account_details(
        &self,
        user_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET full_name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(full_name)
            .bind(email)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Email already in use".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(())
    }

    pub async fn update_avatar(
        &self,
        user_id: &str,
        url: &str,
        key: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar_url = ?, avatar_key = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(key)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_cover_image(
        &self,
        user_id: &str,
        url: &str,
        key: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET cover_url = ?, cover_key = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(key)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Videos
    // =========================================================================

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO videos (id, owner_id, title, description, video_url, video_key, \
             thumbnail_url, thumbnail_key, duration_seconds, views, is_published, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&video.id)
        .bind(&video.owner_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(&video.video_key)
        .bind(&video.thumbnail_url)
        .bind(&video.thumbnail_key)
        .bind(video.duration_seconds)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    pub async fn list_videos_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn update_video_details(
        &self,
        id: &str,
        title: &str,
        description: &str,
        thumbnail_url: &str,
        thumbnail_key: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE videos SET title = ?, description = ?, thumbnail_url = ?, thumbnail_key = ? \
             WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(thumbnail_url)
        .bind(thumbnail_key)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_video_published(&self, id: &str, published: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET is_published = ? WHERE id = ?")
            .bind(published)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn increment_video_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a video and every relation row that references it
    /// (likes, comments and their likes, playlist memberships, watch
    /// history) in one transaction.
    pub async fn delete_video(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM likes WHERE target_kind = 'comment' \
             AND target_id IN (SELECT id FROM comments WHERE video_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM likes WHERE target_id = ? AND target_kind = 'video'")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM playlist_videos WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM watch_history WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO comments (id, video_id, owner_id, content, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.video_id)
        .bind(&comment.owner_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    pub async fn list_comments_for_video(
        &self,
        video_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE video_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn update_comment_content(&self, id: &str, content: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM likes WHERE target_id = ? AND target_kind = 'comment'")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO playlists (id, owner_id, name, description, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&playlist.id)
        .bind(&playlist.owner_id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(playlist)
    }

    pub async fn list_playlists_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Playlist>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(playlists)
    }

    pub async fn update_playlist(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE playlists SET name = ?, description = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Add a video to a playlist. Membership is a set: a duplicate add
    /// hits the unique index and is a no-op.
    pub async fn add_video_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO playlist_videos (playlist_id, video_id, added_at) VALUES (?, ?, ?) \
             ON CONFLICT(playlist_id, video_id) DO NOTHING",
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_video_from_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_playlist_videos(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT v.* FROM videos v \
             JOIN playlist_videos pv ON pv.video_id = v.id \
             WHERE pv.playlist_id = ? ORDER BY pv.added_at",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    pub async fn get_like(
        &self,
        user_id: &str,
        target_id: &str,
        kind: LikeTarget,
    ) -> Result<Option<Like>, AppError> {
        let like = sqlx::query_as::<_, Like>(
            "SELECT * FROM likes WHERE user_id = ? AND target_id = ? AND target_kind = ?",
        )
        .bind(user_id)
        .bind(target_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(like)
    }

    /// Conditionally insert a like on the compound unique key.
    ///
    /// # Returns
    /// `true` if a row was inserted, `false` if the relation already
    /// existed (a concurrent identical toggle won the race).
    pub async fn insert_like_if_absent(
        &self,
        user_id: &str,
        target_id: &str,
        kind: LikeTarget,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO likes (id, user_id, target_id, target_kind, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(user_id, target_id, target_kind) DO NOTHING",
        )
        .bind(EntityId::new().0)
        .bind(user_id)
        .bind(target_id)
        .bind(kind.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete a like keyed by actor and target, never target alone.
    pub async fn delete_like(
        &self,
        user_id: &str,
        target_id: &str,
        kind: LikeTarget,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM likes WHERE user_id = ? AND target_id = ? AND target_kind = ?",
        )
        .bind(user_id)
        .bind(target_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_likes(
        &self,
        target_id: &str,
        kind: LikeTarget,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE target_id = ? AND target_kind = ?",
        )
        .bind(target_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub async fn get_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let sub = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    /// Conditionally insert a subscription on the compound unique key.
    pub async fn insert_subscription_if_absent(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(subscriber_id, channel_id) DO NOTHING",
        )
        .bind(EntityId::new().0)
        .bind(subscriber_id)
        .bind(channel_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Watch history
    // =========================================================================

    /// Record that a user watched a video. Re-watching bumps the
    /// timestamp instead of adding a row.
    pub async fn record_watch(&self, user_id: &str, video_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO watch_history (user_id, video_id, watched_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, video_id) DO UPDATE SET watched_at = excluded.watched_at",
        )
        .bind(user_id)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Read-model joins
    // =========================================================================

    /// Channel profile aggregate: user fields, subscriber counts and
    /// the viewer's own subscription edge. Point-in-time snapshot, no
    /// caching.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: &str,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let Some(user) = self.get_user_by_username(username).await? else {
            return Ok(None);
        };

        let subscriber_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
                .bind(&user.id)
                .fetch_one(&self.pool)
                .await?;
        let subscribed_to_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?")
                .bind(&user.id)
                .fetch_one(&self.pool)
                .await?;
        let is_subscribed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(viewer_id)
        .bind(&user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(ChannelProfile {
            user: user.into(),
            subscriber_count,
            subscribed_to_count,
            is_subscribed: is_subscribed > 0,
        }))
    }

    /// Videos the user has liked, newest like first, with the owner's
    /// display fields nested. Zero likes yields an empty vec.
    pub async fn liked_videos(&self, user_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        let rows = sqlx::query_as::<_, VideoOwnerRow>(&format!(
            "SELECT {VIDEO_OWNER_COLUMNS} FROM likes l \
             JOIN videos v ON v.id = l.target_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE l.user_id = ? AND l.target_kind = 'video' \
             ORDER BY l.created_at DESC",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_video_with_owner(false))
            .collect())
    }

    /// The user's watch history, most recently watched first, with the
    /// owner's display fields (including avatar) nested.
    pub async fn watch_history(&self, user_id: &str) -> Result<Vec<VideoWithOwner>, AppError> {
        let rows = sqlx::query_as::<_, VideoOwnerRow>(&format!(
            "SELECT {VIDEO_OWNER_COLUMNS} FROM watch_history w \
             JOIN videos v ON v.id = w.video_id \
             JOIN users u ON u.id = v.owner_id \
             WHERE w.user_id = ? \
             ORDER BY w.watched_at DESC",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_video_with_owner(true))
            .collect())
    }

    /// Subscribers of a channel with their public fields.
    pub async fn subscribers_of(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT s.id, u.id, u.username, u.full_name, u.avatar_url \
             FROM subscriptions s JOIN users u ON u.id = s.subscriber_id \
             WHERE s.channel_id = ? ORDER BY s.created_at DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, username, full_name, avatar_url)| SubscriptionEntry {
                id,
                user_id,
                username,
                full_name,
                avatar_url,
            })
            .collect())
    }

    /// Channels a user is subscribed to, with their public fields.
    pub async fn subscriptions_of(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<SubscriptionEntry>, AppError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT s.id, u.id, u.username, u.full_name, u.avatar_url \
             FROM subscriptions s JOIN users u ON u.id = s.channel_id \
             WHERE s.subscriber_id = ? ORDER BY s.created_at DESC",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, username, full_name, avatar_url)| SubscriptionEntry {
                id,
                user_id,
                username,
                full_name,
                avatar_url,
            })
            .collect())
    }

    /// Dashboard aggregate for a channel owner.
    pub async fn channel_stats(&self, owner_id: &str) -> Result<ChannelStats, AppError> {
        let (total_videos, total_views): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let total_subscribers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        let total_likes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM likes WHERE target_kind = 'video' \
             AND target_id IN (SELECT id FROM videos WHERE owner_id = ?)",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChannelStats {
            total_videos,
            total_views,
            total_subscribers,
            total_likes,
        })
    }
}
