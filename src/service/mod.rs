//! Service layer
//!
//! Business logic between the HTTP handlers and the data layer:
//! - `account`: identity and session lifecycle
//! - `engagement`: like/subscription toggle engine
//! - `library`: video, comment and playlist mutations
//! - `views`: read-model aggregates

pub mod account;
pub mod engagement;
pub mod library;
pub mod views;

pub use account::AccountService;
pub use engagement::EngagementService;
pub use library::LibraryService;
pub use views::ViewsService;

use crate::error::AppError;

/// Ownership guard: only a resource's creator may mutate it.
///
/// Identifiers are compared by string value, never by identity. The
/// check runs against a freshly fetched record on every request;
/// authorization decisions are never cached.
pub fn assert_owner(owner_id: &str, actor_id: &str, resource: &str) -> Result<(), AppError> {
    if owner_id != actor_id {
        return Err(AppError::Forbidden(format!(
            "You don't have permission to modify this {}",
            resource
        )));
    }
    Ok(())
}

/// Reject blank or whitespace-only required text fields.
pub(crate) fn require_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Validate a path-supplied entity ID before any store lookup.
pub(crate) fn require_valid_id(id: &str, what: &str) -> Result<(), AppError> {
    if !crate::data::EntityId::is_valid(id) {
        return Err(AppError::Validation(format!("Invalid {} ID", what)));
    }
    Ok(())
}
