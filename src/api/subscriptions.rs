//! Subscription endpoints

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::CurrentUser;
use crate::data::{SubscriptionEntry, ToggleState};
use crate::error::AppError;
use crate::AppState;

use super::{build_engagement_service, build_views_service, ApiResponse};

/// Create the subscriptions router
pub fn subscriptions_router() -> Router<AppState> {
    Router::new()
        .route("/toggle/:channel_id", post(toggle_subscription))
        .route("/:channel_id/subscribers", get(subscribers))
        .route("/u/:subscriber_id", get(subscribed_channels))
}

/// POST /api/v1/subscriptions/toggle/:channel_id
async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiResponse<ToggleState>>, AppError> {
    let result = build_engagement_service(&state)
        .toggle_subscription(&user.id, &channel_id)
        .await?;

    let message = match result {
        ToggleState::Added => "Subscribed",
        ToggleState::Removed => "Unsubscribed",
    };

    Ok(ApiResponse::ok(result, message))
}

/// GET /api/v1/subscriptions/:channel_id/subscribers
async fn subscribers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SubscriptionEntry>>>, AppError> {
    let entries = build_views_service(&state).subscribers_of(&channel_id).await?;

    Ok(ApiResponse::ok(entries, "Subscribers fetched"))
}

/// GET /api/v1/subscriptions/u/:subscriber_id
async fn subscribed_channels(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(subscriber_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SubscriptionEntry>>>, AppError> {
    let entries = build_views_service(&state)
        .subscriptions_of(&subscriber_id)
        .await?;

    Ok(ApiResponse::ok(entries, "Subscribed channels fetched"))
}
