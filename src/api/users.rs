//! User endpoints
//!
//! Registration, login, logout, token refresh, password and profile
//! updates, channel profiles and watch history.
//!
//! Tokens ride in `accessToken`/`refreshToken` cookies; clients that
//! cannot use cookies send the access token as a bearer header and
//! receive the pair in the response body as well.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::service::account::{RegisterInput, TokenPair};
use crate::AppState;

use super::multipart::MultipartForm;
use super::{build_account_service, build_views_service, ApiResponse};

/// Create the users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/current-user", get(current_user))
        .route("/change-password", post(change_password))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
}

fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Set both auth cookies from a freshly issued pair
fn with_auth_cookies(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(build_cookie("accessToken", tokens.access_token.clone(), secure))
        .add(build_cookie(
            "refreshToken",
            tokens.refresh_token.clone(),
            secure,
        ))
}

fn without_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build("accessToken").path("/").build())
        .remove(Cookie::build("refreshToken").path("/").build())
}

/// POST /api/v1/users/register
///
/// Multipart: `fullName`, `username`, `email`, `password` text fields
/// plus an `avatar` file (required) and `coverImage` file (optional).
async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/users/register"])
        .start_timer();

    let mut form = MultipartForm::read(multipart).await?;
    let input = RegisterInput {
        full_name: form.require_text("fullName")?,
        username: form.require_text("username")?,
        email: form.require_text("email")?,
        password: form.require_text("password")?,
    };
    let avatar = form.take_file("avatar");
    let cover = form.take_file("coverImage");

    let profile = build_account_service(&state)
        .register(input, avatar, cover)
        .await?;

    Ok(ApiResponse::created(
        serde_json::to_value(profile).map_err(anyhow::Error::from)?,
        "User registered successfully",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    /// Username or email
    #[serde(alias = "email")]
    username: String,
    password: String,
}

/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<serde_json::Value>>), AppError> {
    let (profile, tokens) = build_account_service(&state)
        .login(&req.username, &req.password)
        .await?;

    let jar = with_auth_cookies(jar, &tokens, state.config.should_use_secure_cookies());

    Ok((
        jar,
        ApiResponse::ok(
            serde_json::json!({
                "user": profile,
                "accessToken": tokens.access_token,
                "refreshToken": tokens.refresh_token,
            }),
            "User logged in successfully",
        ),
    ))
}

/// POST /api/v1/users/logout
async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<serde_json::Value>>), AppError> {
    build_account_service(&state).logout(&user.id).await?;

    Ok((
        without_auth_cookies(jar),
        ApiResponse::ok(serde_json::Value::Null, "User logged out"),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

/// POST /api/v1/users/refresh-token
///
/// The refresh token comes from the `refreshToken` cookie or, for
/// cookie-less clients, the request body.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<ApiResponse<serde_json::Value>>), AppError> {
    let presented = jar
        .get("refreshToken")
        .map(|c| c.value().to_owned())
        .or_else(|| body.and_then(|Json(req)| req.refresh_token));

    let tokens = build_account_service(&state)
        .refresh(presented.as_deref())
        .await?;

    let jar = with_auth_cookies(jar, &tokens, state.config.should_use_secure_cookies());

    Ok((
        jar,
        ApiResponse::ok(
            serde_json::json!({
                "accessToken": tokens.access_token,
                "refreshToken": tokens.refresh_token,
            }),
            "Access token refreshed",
        ),
    ))
}

/// GET /api/v1/users/current-user
async fn current_user(
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<crate::data::UserProfile>>, AppError> {
    Ok(ApiResponse::ok(user.into(), "Current user fetched"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    build_account_service(&state)
        .change_password(&user, &req.old_password, &req.new_password)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Password changed successfully",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest {
    full_name: String,
    email: String,
}

/// PATCH /api/v1/users/update-account
async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<crate::data::UserProfile>>, AppError> {
    let profile = build_account_service(&state)
        .update_account(&user, &req.full_name, &req.email)
        .await?;

    Ok(ApiResponse::ok(profile, "Account details updated"))
}

/// PATCH /api/v1/users/avatar
async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<crate::data::UserProfile>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["PATCH", "/api/v1/users/avatar"])
        .start_timer();

    let mut form = MultipartForm::read(multipart).await?;
    let file = form.require_file("avatar")?;

    let profile = build_account_service(&state)
        .update_avatar(&user, file)
        .await?;

    Ok(ApiResponse::ok(profile, "Avatar updated"))
}

/// PATCH /api/v1/users/cover-image
async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<crate::data::UserProfile>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["PATCH", "/api/v1/users/cover-image"])
        .start_timer();

    let mut form = MultipartForm::read(multipart).await?;
    let file = form.require_file("coverImage")?;

    let profile = build_account_service(&state)
        .update_cover_image(&user, file)
        .await?;

    Ok(ApiResponse::ok(profile, "Cover image updated"))
}

/// GET /api/v1/users/c/:username
///
/// Authenticated so the response can carry the viewer's own
/// subscription edge (`isSubscribed`).
async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<crate::data::ChannelProfile>>, AppError> {
    let profile = build_views_service(&state)
        .channel_profile(&username, &user.id)
        .await?;

    Ok(ApiResponse::ok(profile, "Channel profile fetched"))
}

/// GET /api/v1/users/history
async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<crate::data::VideoWithOwner>>>, AppError> {
    let history = build_views_service(&state).watch_history(&user.id).await?;

    Ok(ApiResponse::ok(history, "Watch history fetched"))
}
