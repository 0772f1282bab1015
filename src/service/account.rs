//! Account service
//!
//! Identity and session lifecycle: registration, login, token
//! rotation, logout, password and profile updates.
//!
//! Access tokens are short-lived and stateless; refresh tokens are
//! long-lived, stored on the user record, single-use and rotated on
//! every refresh. Logging in overwrites the stored refresh token, so a
//! user has at most one live session system-wide.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{create_token, verify_token, TokenClaims, TokenKind};
use crate::config::AuthConfig;
use crate::data::{Database, EntityId, User, UserProfile};
use crate::error::AppError;
use crate::storage::{remove_best_effort, MediaStore};

use super::require_text;

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// New-registration input (text fields; files arrive separately)
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// An uploaded file buffered from a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    storage: Arc<dyn MediaStore>,
    auth: AuthConfig,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, storage: Arc<dyn MediaStore>, auth: AuthConfig) -> Self {
        Self { db, storage, auth }
    }

    /// Register a new user
    ///
    /// The avatar is mandatory; the cover image is optional. The user
    /// row is only written after the uploads succeed (fail closed), so
    /// an upload failure leaves the username free for a retry.
    ///
    /// # Errors
    /// * `Validation` - any required text field blank, or avatar missing
    /// * `Conflict` - username or email already taken
    /// * `Dependency` - avatar/cover upload failed
    pub async fn register(
        &self,
        input: RegisterInput,
        avatar: Option<UploadedFile>,
        cover: Option<UploadedFile>,
    ) -> Result<UserProfile, AppError> {
        // 1. Validate text fields
        let full_name = require_text(&input.full_name, "fullName")?;
        let username = require_text(&input.username, "username")?.to_lowercase();
        let email = require_text(&input.email, "email")?.to_lowercase();
        let password = require_text(&input.password, "password")?;

        // 2. Check for an existing identity before uploading anything
        if self.db.username_or_email_exists(&username, &email).await? {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let avatar =
            avatar.ok_or_else(|| AppError::Validation("Avatar file is required".to_string()))?;

        // 3. Upload avatar (mandatory) and cover (optional); metadata
        //    persistence must not proceed on upload failure
        let user_id = EntityId::new().0;
        let stored_avatar = self
            .storage
            .store("avatars", &user_id, avatar.data, &avatar.content_type)
            .await?;

        let stored_cover = match cover {
            Some(file) => Some(
                self.storage
                    .store("covers", &user_id, file.data, &file.content_type)
                    .await?,
            ),
            None => None,
        };

        // 4. Create the user record
        let now = Utc::now();
        let user = User {
            id: user_id,
            username,
            email,
            full_name,
            password_hash: hash_password(&password)?,
            avatar_url: stored_avatar.url,
            avatar_key: stored_avatar.key,
            cover_url: stored_cover.as_ref().map(|c| c.url.clone()),
            cover_key: stored_cover.as_ref().map(|c| c.key.clone()),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_user(&user).await?;

        tracing::info!(username = %user.username, "User registered");

        // 5. Return with credential hash and refresh token stripped
        Ok(user.into())
    }

    /// Log in with username or email
    ///
    /// # Errors
    /// * `NotFound` - no matching identity
    /// * `Unauthorized` - wrong password
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<(UserProfile, TokenPair), AppError> {
        let identity = require_text(username_or_email, "username or email")?.to_lowercase();

        let user = self
            .db
            .get_user_by_identity(&identity)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid user credentials".to_string(),
            ));
        }

        // Issue tokens and persist the refresh value, overwriting any
        // prior session.
        let tokens = self.issue_tokens(&user.id)?;
        self.db
            .set_refresh_token(&user.id, &tokens.refresh_token)
            .await?;

        tracing::info!(username = %user.username, "User logged in");

        Ok((user.into(), tokens))
    }

    /// Rotate an access/refresh pair
    ///
    /// The presented refresh token must verify and byte-equal the
    /// value currently stored on the user; any reuse of a superseded
    /// token is rejected. The rotation write is a compare-and-set on
    /// the presented value, so two concurrent refreshes cannot both
    /// succeed.
    ///
    /// # Errors
    /// `Unauthorized` - token absent, invalid, expired, stale or reused
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AppError> {
        let presented = presented.ok_or_else(AppError::unauthorized)?;

        let claims = verify_token(
            presented,
            &self.auth.refresh_token_secret,
            TokenKind::Refresh,
        )
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        let user = self
            .db
            .get_user(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        // Replay detection: a rotated-out token no longer matches the
        // stored value.
        if user.refresh_token.as_deref() != Some(presented) {
            return Err(AppError::Unauthorized(
                "Refresh token is expired or already used".to_string(),
            ));
        }

        let tokens = self.issue_tokens(&user.id)?;
        let rotated = self
            .db
            .rotate_refresh_token(&user.id, presented, &tokens.refresh_token)
            .await?;
        if !rotated {
            // A concurrent refresh rotated first; this one loses.
            return Err(AppError::Unauthorized(
                "Refresh token is expired or already used".to_string(),
            ));
        }

        Ok(tokens)
    }

    /// Log out: clear the refresh-token slot unconditionally
    pub async fn logout(&self, actor_id: &str) -> Result<(), AppError> {
        self.db.clear_refresh_token(actor_id).await
    }

    /// Change password after re-verifying the old one
    ///
    /// # Errors
    /// `Unauthorized` - old password check failed
    pub async fn change_password(
        &self,
        actor: &User,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if !verify_password(old_password, &actor.password_hash)? {
            return Err(AppError::Unauthorized(
                "Incorrect old password".to_string(),
            ));
        }

        let new_password = require_text(new_password, "new password")?;
        let hash = hash_password(&new_password)?;
        self.db.update_password_hash(&actor.id, &hash).await
    }

    /// Update full name and email
    pub async fn update_account(
        &self,
        actor: &User,
        full_name: &str,
        email: &str,
    ) -> Result<UserProfile, AppError> {
        let full_name = require_text(full_name, "fullName")?;
        let email = require_text(email, "email")?.to_lowercase();

        self.db
            .update_account_details(&actor.id, &full_name, &email)
            .await?;

        self.db
            .get_user(&actor.id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
    }

    /// Replace the avatar image
    ///
    /// The new file is uploaded first (fail closed); the old asset is
    /// removed best-effort after the record update.
    pub async fn update_avatar(
        &self,
        actor: &User,
        file: UploadedFile,
    ) -> Result<UserProfile, AppError> {
        let stored = self
            .storage
            .store("avatars", &EntityId::new().0, file.data, &file.content_type)
            .await?;

        self.db
            .update_avatar(&actor.id, &stored.url, &stored.key)
            .await?;

        remove_best_effort(self.storage.as_ref(), &actor.avatar_key).await;

        self.db
            .get_user(&actor.id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
    }

    /// Replace the cover image
    pub async fn update_cover_image(
        &self,
        actor: &User,
        file: UploadedFile,
    ) -> Result<UserProfile, AppError> {
        let stored = self
            .storage
            .store("covers", &EntityId::new().0, file.data, &file.content_type)
            .await?;

        self.db
            .update_cover_image(&actor.id, &stored.url, &stored.key)
            .await?;

        if let Some(old_key) = &actor.cover_key {
            remove_best_effort(self.storage.as_ref(), old_key).await;
        }

        self.db
            .get_user(&actor.id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
    }

    /// Mint a fresh access/refresh pair for an actor
    fn issue_tokens(&self, actor_id: &str) -> Result<TokenPair, AppError> {
        let access_claims =
            TokenClaims::new(actor_id, TokenKind::Access, self.auth.access_token_ttl);
        let refresh_claims =
            TokenClaims::new(actor_id, TokenKind::Refresh, self.auth.refresh_token_ttl);

        Ok(TokenPair {
            access_token: create_token(&access_claims, &self.auth.access_token_secret)?,
            refresh_token: create_token(&refresh_claims, &self.auth.refresh_token_secret)?,
        })
    }
}
