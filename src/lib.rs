//! Clipstream - a media-sharing platform backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /api/v1 JSON endpoints, uniform response envelope        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Sessions, toggles, ownership guards, read models         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - R2 blob storage                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: business logic (accounts, engagement, library, views)
//! - `data`: database layer and models
//! - `storage`: blob storage for video and image assets
//! - `auth`: token codec, password hashing, request authentication
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned per request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Media blob storage
    pub storage: Arc<dyn storage::MediaStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Connects to SQLite (running migrations) and to the R2 bucket.
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        let storage = storage::R2MediaStorage::new(&config.storage).await?;
        tracing::info!("Media storage initialized");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            storage: Arc::new(storage),
        })
    }

    /// Build state around an existing database and storage backend
    ///
    /// Used by the test harness to swap in an in-memory blob store.
    pub fn with_parts(
        config: config::AppConfig,
        db: Arc<data::Database>,
        storage: Arc<dyn storage::MediaStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            storage,
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    let api_v1 = Router::new()
        .nest("/users", api::users_router())
        .nest("/videos", api::videos_router())
        .nest("/comments", api::comments_router())
        .nest("/likes", api::likes_router())
        .nest("/subscriptions", api::subscriptions_router())
        .nest("/playlists", api::playlists_router())
        .nest("/dashboard", api::dashboard_router());

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api_v1)
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
