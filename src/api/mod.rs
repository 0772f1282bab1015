//! API layer
//!
//! HTTP handlers for the versioned client API:
//! - Users (identity, sessions, channel profiles, watch history)
//! - Videos, comments and playlists
//! - Likes and subscriptions (relation toggles)
//! - Dashboard (channel stats)
//! - Metrics (Prometheus)
//!
//! Every success response uses the same JSON envelope as the error
//! path: `{statusCode, data, message, success}`.

mod comments;
mod dashboard;
mod likes;
pub mod metrics;
mod multipart;
mod playlists;
mod subscriptions;
mod users;
mod videos;

pub use comments::comments_router;
pub use dashboard::dashboard_router;
pub use likes::likes_router;
pub use metrics::metrics_router;
pub use playlists::playlists_router;
pub use subscriptions::subscriptions_router;
pub use users::users_router;
pub use videos::videos_router;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::service::{AccountService, EngagementService, LibraryService, ViewsService};
use crate::AppState;

/// Standard success envelope
///
/// `statusCode` is duplicated inside the body because clients read it
/// there rather than from the transport.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK envelope
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status_code: StatusCode::OK.as_u16(),
            data,
            message: message.into(),
            success: true,
        })
    }

    /// 201 Created envelope
    pub fn created(data: T, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                status_code: StatusCode::CREATED.as_u16(),
                data,
                message: message.into(),
                success: true,
            }),
        )
    }
}

// Per-request service construction. Services are cheap to build (two
// Arc clones) and hold no request state.

fn build_account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.db.clone(),
        state.storage.clone(),
        state.config.auth.clone(),
    )
}

fn build_engagement_service(state: &AppState) -> EngagementService {
    EngagementService::new(state.db.clone())
}

fn build_library_service(state: &AppState) -> LibraryService {
    LibraryService::new(state.db.clone(), state.storage.clone())
}

fn build_views_service(state: &AppState) -> ViewsService {
    ViewsService::new(state.db.clone())
}
