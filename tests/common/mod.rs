//! Common test utilities for E2E tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clipstream::storage::{MediaStore, StoredMedia};
use clipstream::{config, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// In-memory blob store standing in for R2
///
/// Records every stored blob under its key and can be flipped into a
/// failing mode to exercise fail-closed upload paths.
#[derive(Default)]
pub struct MemoryMediaStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `store` call fail
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Whether a blob is currently held under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn store(
        &self,
        prefix: &str,
        id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredMedia, clipstream::error::AppError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(clipstream::error::AppError::Dependency(
                "simulated upload failure".to_string(),
            ));
        }

        let extension = content_type.rsplit('/').next().unwrap_or("bin");
        let key = format!("{}/{}.{}", prefix, id, extension);
        self.blobs.lock().unwrap().insert(key.clone(), data);

        Ok(StoredMedia {
            url: format!("https://media.test.example.com/{}", key),
            key,
            duration_seconds: 0.0,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), clipstream::error::AppError> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub media: Arc<MemoryMediaStore>,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                bucket: "test-media".to_string(),
                public_url: "https://media.test.example.com".to_string(),
                account_id: "test-account".to_string(),
                access_key_id: "test-key".to_string(),
                secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                access_token_secret: "access-secret-key-32-bytes-long!".to_string(),
                access_token_ttl: 900,
                refresh_token_secret: "refresh-secret-key-32-bytes-lng!".to_string(),
                refresh_token_ttl: 864000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Connect the database directly; storage is swapped for the
        // in-memory fake so no network is touched.
        let db = clipstream::data::Database::connect(&db_path).await.unwrap();
        let media = Arc::new(MemoryMediaStore::new());
        let state = AppState::with_parts(config, Arc::new(db), media.clone());

        // Create HTTP client with a cookie store so auth cookies flow
        // through like a browser session
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = clipstream::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            media,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return their profile JSON
    ///
    /// Uses a multipart form with a tiny in-memory avatar.
    pub async fn register_user(&self, username: &str) -> serde_json::Value {
        let form = reqwest::multipart::Form::new()
            .text("fullName", format!("{} Test", username))
            .text("username", username.to_string())
            .text("email", format!("{}@test.example.com", username))
            .text("password", "correct-horse-battery")
            .part(
                "avatar",
                reqwest::multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF])
                    .file_name("avatar.jpg")
                    .mime_str("image/jpeg")
                    .unwrap(),
            );

        let response = self
            .client
            .post(self.url("/api/v1/users/register"))
            .multipart(form)
            .send()
            .await
            .expect("register request succeeds");
        assert_eq!(response.status(), 201, "registration should succeed");

        let body: serde_json::Value = response.json().await.expect("register response body");
        body["data"].clone()
    }

    /// Log a user in; the shared client keeps the auth cookies
    pub async fn login_user(&self, username: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/v1/users/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": "correct-horse-battery",
            }))
            .send()
            .await
            .expect("login request succeeds");
        assert_eq!(response.status(), 200, "login should succeed");

        let body: serde_json::Value = response.json().await.expect("login response body");
        body["data"].clone()
    }

    /// Register and log in, returning the profile JSON
    pub async fn register_and_login(&self, username: &str) -> serde_json::Value {
        let profile = self.register_user(username).await;
        self.login_user(username).await;
        profile
    }

    /// Publish a video as the currently logged-in user
    pub async fn publish_video(&self, title: &str) -> serde_json::Value {
        let form = reqwest::multipart::Form::new()
            .text("title", title.to_string())
            .text("description", format!("{} description", title))
            .part(
                "videoFile",
                reqwest::multipart::Part::bytes(vec![0x00, 0x01, 0x02, 0x03])
                    .file_name("clip.mp4")
                    .mime_str("video/mp4")
                    .unwrap(),
            )
            .part(
                "thumbnail",
                reqwest::multipart::Part::bytes(vec![0xFF, 0xD8])
                    .file_name("thumb.jpg")
                    .mime_str("image/jpeg")
                    .unwrap(),
            );

        let response = self
            .client
            .post(self.url("/api/v1/videos"))
            .multipart(form)
            .send()
            .await
            .expect("publish request succeeds");
        assert_eq!(response.status(), 201, "publish should succeed");

        let body: serde_json::Value = response.json().await.expect("publish response body");
        body["data"].clone()
    }

    /// A fresh client with its own cookie store, for a second session
    pub fn new_session(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap()
    }
}
