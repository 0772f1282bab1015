//! Comment endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::data::Comment;
use crate::error::AppError;
use crate::AppState;

use super::videos::PageQuery;
use super::{build_library_service, ApiResponse};

/// Create the comments router
pub fn comments_router() -> Router<AppState> {
    Router::new()
        .route("/:video_id", get(list_comments))
        .route("/:video_id", post(add_comment))
        .route("/c/:comment_id", patch(update_comment))
        .route("/c/:comment_id", delete(delete_comment))
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    content: String,
}

/// GET /api/v1/comments/:video_id
async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, AppError> {
    let comments = build_library_service(&state)
        .list_comments(&video_id, query.into())
        .await?;

    Ok(ApiResponse::ok(comments, "Comments fetched"))
}

/// POST /api/v1/comments/:video_id
async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), AppError> {
    let comment = build_library_service(&state)
        .add_comment(&user, &video_id, &body.content)
        .await?;

    Ok(ApiResponse::created(comment, "Comment added"))
}

/// PATCH /api/v1/comments/c/:comment_id
async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<Json<ApiResponse<Comment>>, AppError> {
    let comment = build_library_service(&state)
        .update_comment(&user, &comment_id, &body.content)
        .await?;

    Ok(ApiResponse::ok(comment, "Comment updated"))
}

/// DELETE /api/v1/comments/c/:comment_id
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    build_library_service(&state)
        .delete_comment(&user, &comment_id)
        .await?;

    Ok(ApiResponse::ok(serde_json::Value::Null, "Comment deleted"))
}
