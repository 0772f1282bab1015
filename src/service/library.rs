//! Library service
//!
//! Video, comment and playlist mutations. Every mutation of an
//! existing resource re-fetches the record and runs the ownership
//! guard before touching anything.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Comment, Database, EntityId, Playlist, User, Video};
use crate::error::AppError;
use crate::storage::{remove_best_effort, MediaStore};

use super::account::UploadedFile;
use super::{assert_owner, require_text, require_valid_id};

/// Pagination parameters (accepted as-is; page is 1-based)
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Library service
pub struct LibraryService {
    db: Arc<Database>,
    storage: Arc<dyn MediaStore>,
}

impl LibraryService {
    /// Create new library service
    pub fn new(db: Arc<Database>, storage: Arc<dyn MediaStore>) -> Self {
        Self { db, storage }
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Publish a new video
    ///
    /// Both the video file and the thumbnail are required; the record
    /// is only written after both uploads succeed (fail closed).
    pub async fn publish_video(
        &self,
        actor: &User,
        title: &str,
        description: &str,
        video_file: Option<UploadedFile>,
        thumbnail: Option<UploadedFile>,
    ) -> Result<Video, AppError> {
        let title = require_text(title, "title")?;
        let description = require_text(description, "description")?;
        let video_file = video_file
            .ok_or_else(|| AppError::Validation("Video file is required".to_string()))?;
        let thumbnail = thumbnail
            .ok_or_else(|| AppError::Validation("Thumbnail file is required".to_string()))?;

        let video_id = EntityId::new().0;
        let stored_video = self
            .storage
            .store("videos", &video_id, video_file.data, &video_file.content_type)
            .await?;
        let stored_thumbnail = self
            .storage
            .store(
                "thumbnails",
                &video_id,
                thumbnail.data,
                &thumbnail.content_type,
            )
            .await?;

        let video = Video {
            id: video_id,
            owner_id: actor.id.clone(),
            title,
            description,
            video_url: stored_video.url,
            video_key: stored_video.key,
            thumbnail_url: stored_thumbnail.url,
            thumbnail_key: stored_thumbnail.key,
            duration_seconds: stored_video.duration_seconds,
            views: 0,
            is_published: true,
            created_at: Utc::now(),
        };
        self.db.insert_video(&video).await?;

        tracing::info!(video_id = %video.id, owner = %actor.username, "Video published");

        Ok(video)
    }

    /// Fetch a video, bump its view count and record the viewer's
    /// watch history
    pub async fn get_video(&self, viewer_id: &str, video_id: &str) -> Result<Video, AppError> {
        require_valid_id(video_id, "video")?;
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        self.db.increment_video_views(video_id).await?;
        self.db.record_watch(viewer_id, video_id).await?;

        Ok(video)
    }

    /// List a user's videos with pagination
    pub async fn list_videos(&self, owner_id: &str, page: Page) -> Result<Vec<Video>, AppError> {
        require_valid_id(owner_id, "user")?;
        self.db
            .list_videos_by_owner(owner_id, page.limit, page.offset())
            .await
    }

    /// Update title, description and/or thumbnail
    ///
    /// At least one field must be supplied. The old thumbnail is
    /// removed best-effort after the record update.
    pub async fn update_video(
        &self,
        actor: &User,
        video_id: &str,
        title: Option<String>,
        description: Option<String>,
        thumbnail: Option<UploadedFile>,
    ) -> Result<Video, AppError> {
        require_valid_id(video_id, "video")?;
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        assert_owner(&video.owner_id, &actor.id, "video")?;

        if title.is_none() && description.is_none() && thumbnail.is_none() {
            return Err(AppError::Validation(
                "Title, description or thumbnail is required".to_string(),
            ));
        }

        let title = match title {
            Some(t) => require_text(&t, "title")?,
            None => video.title.clone(),
        };
        let description = match description {
            Some(d) => require_text(&d, "description")?,
            None => video.description.clone(),
        };

        let (thumbnail_url, thumbnail_key, old_thumbnail_key) = match thumbnail {
            Some(file) => {
                let stored = self
                    .storage
                    .store("thumbnails", &EntityId::new().0, file.data, &file.content_type)
                    .await?;
                (stored.url, stored.key, Some(video.thumbnail_key.clone()))
            }
            None => (
                video.thumbnail_url.clone(),
                video.thumbnail_key.clone(),
                None,
            ),
        };

        self.db
            .update_video_details(video_id, &title, &description, &thumbnail_url, &thumbnail_key)
            .await?;

        if let Some(old_key) = old_thumbnail_key {
            remove_best_effort(self.storage.as_ref(), &old_key).await;
        }

        self.db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    /// Delete a video and its relations; blob removal is best-effort
    pub async fn delete_video(&self, actor: &User, video_id: &str) -> Result<(), AppError> {
        require_valid_id(video_id, "video")?;
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        assert_owner(&video.owner_id, &actor.id, "video")?;

        self.db.delete_video(video_id).await?;

        remove_best_effort(self.storage.as_ref(), &video.video_key).await;
        remove_best_effort(self.storage.as_ref(), &video.thumbnail_key).await;

        tracing::info!(video_id = %video_id, "Video deleted");

        Ok(())
    }

    /// Flip the published flag
    pub async fn toggle_publish(&self, actor: &User, video_id: &str) -> Result<Video, AppError> {
        require_valid_id(video_id, "video")?;
        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        assert_owner(&video.owner_id, &actor.id, "video")?;

        self.db
            .set_video_published(video_id, !video.is_published)
            .await?;

        self.db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Add a comment to a video
    pub async fn add_comment(
        &self,
        actor: &User,
        video_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        require_valid_id(video_id, "video")?;
        let content = require_text(content, "content")?;

        if self.db.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        let comment = Comment {
            id: EntityId::new().0,
            video_id: video_id.to_string(),
            owner_id: actor.id.clone(),
            content,
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;

        Ok(comment)
    }

    /// List a video's comments with pagination
    pub async fn list_comments(
        &self,
        video_id: &str,
        page: Page,
    ) -> Result<Vec<Comment>, AppError> {
        require_valid_id(video_id, "video")?;
        if self.db.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        self.db
            .list_comments_for_video(video_id, page.limit, page.offset())
            .await
    }

    /// Update a comment's content (owner only)
    pub async fn update_comment(
        &self,
        actor: &User,
        comment_id: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        require_valid_id(comment_id, "comment")?;
        let content = require_text(content, "content")?;

        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        assert_owner(&comment.owner_id, &actor.id, "comment")?;

        self.db.update_comment_content(comment_id, &content).await?;

        self.db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }

    /// Delete a comment (owner only)
    pub async fn delete_comment(&self, actor: &User, comment_id: &str) -> Result<(), AppError> {
        require_valid_id(comment_id, "comment")?;
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        assert_owner(&comment.owner_id, &actor.id, "comment")?;

        self.db.delete_comment(comment_id).await
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Create a playlist
    pub async fn create_playlist(
        &self,
        actor: &User,
        name: &str,
        description: &str,
    ) -> Result<Playlist, AppError> {
        let name = require_text(name, "name")?;
        let description = require_text(description, "description")?;

        let playlist = Playlist {
            id: EntityId::new().0,
            owner_id: actor.id.clone(),
            name,
            description,
            created_at: Utc::now(),
        };
        self.db.insert_playlist(&playlist).await?;

        Ok(playlist)
    }

    /// Fetch a playlist with its member videos
    pub async fn get_playlist(
        &self,
        playlist_id: &str,
    ) -> Result<(Playlist, Vec<Video>), AppError> {
        require_valid_id(playlist_id, "playlist")?;
        let playlist = self
            .db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;
        let videos = self.db.list_playlist_videos(playlist_id).await?;

        Ok((playlist, videos))
    }

    /// List a user's playlists
    pub async fn list_playlists(&self, user_id: &str) -> Result<Vec<Playlist>, AppError> {
        require_valid_id(user_id, "user")?;
        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.db.list_playlists_by_owner(user_id).await
    }

    /// Update playlist name and/or description (owner only)
    pub async fn update_playlist(
        &self,
        actor: &User,
        playlist_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Playlist, AppError> {
        require_valid_id(playlist_id, "playlist")?;
        if name.is_none() && description.is_none() {
            return Err(AppError::Validation(
                "Name or description is required".to_string(),
            ));
        }

        let playlist = self
            .db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;
        assert_owner(&playlist.owner_id, &actor.id, "playlist")?;

        let name = match name {
            Some(n) => require_text(&n, "name")?,
            None => playlist.name.clone(),
        };
        let description = match description {
            Some(d) => require_text(&d, "description")?,
            None => playlist.description.clone(),
        };

        self.db
            .update_playlist(playlist_id, &name, &description)
            .await?;

        self.db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))
    }

    /// Delete a playlist (owner only)
    pub async fn delete_playlist(&self, actor: &User, playlist_id: &str) -> Result<(), AppError> {
        require_valid_id(playlist_id, "playlist")?;
        let playlist = self
            .db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;
        assert_owner(&playlist.owner_id, &actor.id, "playlist")?;

        self.db.delete_playlist(playlist_id).await
    }

    /// Add a video to a playlist
    ///
    /// Touches two resources, so the actor must own both the playlist
    /// and the video. A duplicate add is a no-op (membership set).
    pub async fn add_video_to_playlist(
        &self,
        actor: &User,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        require_valid_id(playlist_id, "playlist")?;
        require_valid_id(video_id, "video")?;

        let playlist = self
            .db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;
        assert_owner(&playlist.owner_id, &actor.id, "playlist")?;

        let video = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        assert_owner(&video.owner_id, &actor.id, "video")?;

        self.db.add_video_to_playlist(playlist_id, video_id).await
    }

    /// Remove a video from a playlist (playlist owner only)
    pub async fn remove_video_from_playlist(
        &self,
        actor: &User,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        require_valid_id(playlist_id, "playlist")?;
        require_valid_id(video_id, "video")?;

        let playlist = self
            .db
            .get_playlist(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;
        assert_owner(&playlist.owner_id, &actor.id, "playlist")?;

        let removed = self
            .db
            .remove_video_from_playlist(playlist_id, video_id)
            .await?;
        if !removed {
            return Err(AppError::NotFound(
                "Video is not in this playlist".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamping() {
        let page = Page::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset(), 0);

        let page = Page::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);

        let page = Page::new(Some(0), Some(1000));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
    }
}
