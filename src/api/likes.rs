//! Like endpoints
//!
//! Toggle routes return the resulting relation state so clients never
//! have to guess which side of the flip they landed on.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::CurrentUser;
use crate::data::{ToggleState, VideoWithOwner};
use crate::error::AppError;
use crate::AppState;

use super::{build_engagement_service, build_views_service, ApiResponse};

/// Create the likes router
pub fn likes_router() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:video_id", post(toggle_video_like))
        .route("/toggle/c/:comment_id", post(toggle_comment_like))
        .route("/videos", get(liked_videos))
}

fn toggle_message(state: ToggleState, what: &str) -> String {
    match state {
        ToggleState::Added => format!("{} liked", what),
        ToggleState::Removed => format!("{} like removed", what),
    }
}

/// POST /api/v1/likes/toggle/v/:video_id
async fn toggle_video_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<ApiResponse<ToggleState>>, AppError> {
    let result = build_engagement_service(&state)
        .toggle_video_like(&user.id, &video_id)
        .await?;

    Ok(ApiResponse::ok(result, toggle_message(result, "Video")))
}

/// POST /api/v1/likes/toggle/c/:comment_id
async fn toggle_comment_like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiResponse<ToggleState>>, AppError> {
    let result = build_engagement_service(&state)
        .toggle_comment_like(&user.id, &comment_id)
        .await?;

    Ok(ApiResponse::ok(result, toggle_message(result, "Comment")))
}

/// GET /api/v1/likes/videos
///
/// The actor's liked videos with nested owner projections. Zero likes
/// yields an empty list, not an error.
async fn liked_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<VideoWithOwner>>>, AppError> {
    let videos = build_views_service(&state).liked_videos(&user.id).await?;

    Ok(ApiResponse::ok(videos, "Liked videos fetched"))
}
