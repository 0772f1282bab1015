//! Video endpoints
//!
//! Publish, fetch (with view counting and watch-history recording),
//! list, update, delete and publish-toggle.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::data::Video;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::service::library::Page;
use crate::AppState;

use super::multipart::MultipartForm;
use super::{build_library_service, ApiResponse};

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageQuery> for Page {
    fn from(q: PageQuery) -> Self {
        Page::new(q.page, q.limit)
    }
}

/// Create the videos router
pub fn videos_router() -> Router<AppState> {
    Router::new()
        .route("/", post(publish_video))
        .route("/:video_id", get(get_video))
        .route("/:video_id", patch(update_video))
        .route("/:video_id", delete(delete_video))
        .route("/u/:user_id", get(list_videos))
        .route("/toggle/publish/:video_id", patch(toggle_publish))
}

/// POST /api/v1/videos
///
/// Multipart: `title` and `description` text fields plus `videoFile`
/// and `thumbnail` files, both required.
async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Video>>), AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/videos"])
        .start_timer();

    let mut form = MultipartForm::read(multipart).await?;
    let title = form.require_text("title")?;
    let description = form.require_text("description")?;
    let video_file = form.take_file("videoFile");
    let thumbnail = form.take_file("thumbnail");

    let video = build_library_service(&state)
        .publish_video(&user, &title, &description, video_file, thumbnail)
        .await?;

    Ok(ApiResponse::created(video, "Video published successfully"))
}

/// GET /api/v1/videos/:video_id
///
/// Bumps the view count and records the viewer's watch history as a
/// side effect of every fetch.
async fn get_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let video = build_library_service(&state)
        .get_video(&user.id, &video_id)
        .await?;

    Ok(ApiResponse::ok(video, "Video fetched"))
}

/// GET /api/v1/videos/u/:user_id
async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Video>>>, AppError> {
    let videos = build_library_service(&state)
        .list_videos(&user_id, query.into())
        .await?;

    Ok(ApiResponse::ok(videos, "Videos fetched"))
}

/// PATCH /api/v1/videos/:video_id
///
/// Multipart: optional `title` and `description` text fields and an
/// optional `thumbnail` file; at least one must be present.
async fn update_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let title = form.text("title");
    let description = form.text("description");
    let thumbnail = form.take_file("thumbnail");

    let video = build_library_service(&state)
        .update_video(&user, &video_id, title, description, thumbnail)
        .await?;

    Ok(ApiResponse::ok(video, "Video updated"))
}

/// DELETE /api/v1/videos/:video_id
async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    build_library_service(&state)
        .delete_video(&user, &video_id)
        .await?;

    Ok(ApiResponse::ok(serde_json::Value::Null, "Video deleted"))
}

/// PATCH /api/v1/videos/toggle/publish/:video_id
async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiResponse<Video>>, AppError> {
    let video = build_library_service(&state)
        .toggle_publish(&user, &video_id)
        .await?;

    Ok(ApiResponse::ok(video, "Publish state toggled"))
}
