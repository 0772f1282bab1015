//! Channel dashboard endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::CurrentUser;
use crate::data::ChannelStats;
use crate::error::AppError;
use crate::AppState;

use super::{build_views_service, ApiResponse};

/// Create the dashboard router
pub fn dashboard_router() -> Router<AppState> {
    Router::new().route("/stats", get(channel_stats))
}

/// GET /api/v1/dashboard/stats
///
/// Aggregates for the actor's own channel: video, view, subscriber
/// and like totals.
async fn channel_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<ChannelStats>>, AppError> {
    let stats = build_views_service(&state).channel_stats(&user.id).await?;

    Ok(ApiResponse::ok(stats, "Channel stats fetched"))
}
