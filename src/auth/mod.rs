//! Authentication module
//!
//! - `token`: HMAC-signed access/refresh token codec
//! - `password`: Argon2id password hashing
//! - `middleware`: extractors for authenticated routes

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::CurrentUser;
pub use token::{TokenClaims, TokenKind};
