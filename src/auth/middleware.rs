//! Authentication middleware
//!
//! Protects routes that require authentication. Every protected
//! handler takes [`CurrentUser`], which resolves the presented access
//! token to the actor's user record on each request.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;

use super::token::{verify_token, TokenKind};
use crate::data::User;
use crate::error::AppError;
use crate::AppState;

/// Pull the access token from the `accessToken` cookie or the
/// `Authorization: Bearer` header.
fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get("accessToken")
        .map(|cookie| cookie.value().to_owned())
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(ToOwned::to_owned)
        })
}

/// Resolve a presented access token to the actor's user record.
///
/// # Errors
/// `Unauthorized` if the signature or expiry check fails or the
/// referenced user no longer exists.
async fn authenticate_token(token: &str, state: &AppState) -> Result<User, AppError> {
    let claims = verify_token(
        token,
        &state.config.auth.access_token_secret,
        TokenKind::Access,
    )?;

    state
        .db
        .get_user(&claims.sub)
        .await?
        .ok_or_else(AppError::invalid_token)
}

/// Extractor for the current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = extract_access_token(&parts.headers).ok_or_else(AppError::unauthorized)?;
        let user = authenticate_token(&token, &state).await?;

        Ok(CurrentUser(user))
    }
}
