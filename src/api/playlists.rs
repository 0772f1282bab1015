//! Playlist endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::data::{Playlist, Video};
use crate::error::AppError;
use crate::AppState;

use super::{build_library_service, ApiResponse};

/// Create the playlists router
pub fn playlists_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/:playlist_id", get(get_playlist))
        .route("/:playlist_id", patch(update_playlist))
        .route("/:playlist_id", delete(delete_playlist))
        .route("/user/:user_id", get(list_playlists))
        .route("/:playlist_id/videos/:video_id", post(add_video))
        .route("/:playlist_id/videos/:video_id", delete(remove_video))
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistRequest {
    name: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct UpdatePlaylistRequest {
    name: Option<String>,
    description: Option<String>,
}

/// Playlist with its member videos
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistWithVideos {
    #[serde(flatten)]
    playlist: Playlist,
    videos: Vec<Video>,
}

/// POST /api/v1/playlists
async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Playlist>>), AppError> {
    let playlist = build_library_service(&state)
        .create_playlist(&user, &req.name, &req.description)
        .await?;

    Ok(ApiResponse::created(playlist, "Playlist created"))
}

/// GET /api/v1/playlists/:playlist_id
async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (playlist, videos) = build_library_service(&state)
        .get_playlist(&playlist_id)
        .await?;

    let body = PlaylistWithVideos { playlist, videos };

    Ok(ApiResponse::ok(
        serde_json::to_value(body).map_err(anyhow::Error::from)?,
        "Playlist fetched",
    ))
}

/// GET /api/v1/playlists/user/:user_id
async fn list_playlists(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Playlist>>>, AppError> {
    let playlists = build_library_service(&state).list_playlists(&user_id).await?;

    Ok(ApiResponse::ok(playlists, "Playlists fetched"))
}

/// PATCH /api/v1/playlists/:playlist_id
async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<Json<ApiResponse<Playlist>>, AppError> {
    let playlist = build_library_service(&state)
        .update_playlist(&user, &playlist_id, req.name, req.description)
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist updated"))
}

/// DELETE /api/v1/playlists/:playlist_id
async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    build_library_service(&state)
        .delete_playlist(&user, &playlist_id)
        .await?;

    Ok(ApiResponse::ok(serde_json::Value::Null, "Playlist deleted"))
}

/// POST /api/v1/playlists/:playlist_id/videos/:video_id
async fn add_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    build_library_service(&state)
        .add_video_to_playlist(&user, &playlist_id, &video_id)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Video added to playlist",
    ))
}

/// DELETE /api/v1/playlists/:playlist_id/videos/:video_id
async fn remove_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    build_library_service(&state)
        .remove_video_from_playlist(&user, &playlist_id, &video_id)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Video removed from playlist",
    ))
}
