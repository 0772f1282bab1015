//! E2E tests for videos, comments, playlists and the ownership guard

mod common;

use common::TestServer;

async fn login_on(server: &TestServer, client: &reqwest::Client, username: &str) {
    let response = client
        .post(server.url("/api/v1/users/login"))
        .json(&serde_json::json!({
            "username": username,
            "password": "correct-horse-battery",
        }))
        .send()
        .await
        .expect("login request succeeds");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_publish_and_fetch_video() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;

    let video = server.publish_video("First clip").await;
    let video_id = video["id"].as_str().expect("video id");
    assert_eq!(video["title"], "First clip");
    assert_eq!(video["views"], 0);
    assert_eq!(video["isPublished"], true);

    // Each fetch bumps the view count
    for expected_views in [0, 1] {
        let response = server
            .client
            .get(server.url(&format!("/api/v1/videos/{}", video_id)))
            .send()
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.expect("body");
        assert_eq!(body["data"]["views"], expected_views);
    }

    // Watching put the video into the viewer's history, once
    let response = server
        .client
        .get(server.url("/api/v1/users/history"))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    let history = body["data"].as_array().expect("list");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], *video_id);
    assert_eq!(history[0]["owner"]["username"], "alice");
}

#[tokio::test]
async fn test_publish_requires_both_files() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "No video file")
        .text("description", "missing upload")
        .part(
            "thumbnail",
            reqwest::multipart::Part::bytes(vec![0xFF])
                .file_name("thumb.jpg")
                .mime_str("image/jpeg")
                .unwrap(),
        );

    let response = server
        .client
        .post(server.url("/api/v1/videos"))
        .multipart(form)
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_video_mutations_guarded_by_ownership() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;
    let video = server.publish_video("Alice's clip").await;
    let video_id = video["id"].as_str().expect("video id").to_string();

    server.register_user("bob").await;
    let bob = server.new_session();
    login_on(&server, &bob, "bob").await;

    // A non-owner cannot update, delete or unpublish
    let form = reqwest::multipart::Form::new().text("title", "Hijacked");
    let response = bob
        .patch(server.url(&format!("/api/v1/videos/{}", video_id)))
        .multipart(form)
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 403);

    let response = bob
        .delete(server.url(&format!("/api/v1/videos/{}", video_id)))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 403);

    let response = bob
        .patch(server.url(&format!("/api/v1/videos/toggle/publish/{}", video_id)))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 403);

    // The owner can
    let form = reqwest::multipart::Form::new().text("title", "Renamed clip");
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/videos/{}", video_id)))
        .multipart(form)
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["data"]["title"], "Renamed clip");
}

#[tokio::test]
async fn test_delete_video_cascades_and_removes_blobs() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;
    let video = server.publish_video("Doomed clip").await;
    let video_id = video["id"].as_str().expect("video id").to_string();

    // avatar + video + thumbnail
    assert_eq!(server.media.blob_count(), 3);

    server
        .client
        .post(server.url(&format!("/api/v1/likes/toggle/v/{}", video_id)))
        .send()
        .await
        .expect("request succeeds");

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/videos/{}", video_id)))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 200);

    // Video and thumbnail blobs are gone, only the avatar remains
    assert_eq!(server.media.blob_count(), 1);

    let response = server
        .client
        .get(server.url(&format!("/api/v1/videos/{}", video_id)))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 404);

    // The like rows went with it
    let response = server
        .client
        .get(server.url("/api/v1/likes/videos"))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["data"].as_array().expect("list").len(), 0);
}

#[tokio::test]
async fn test_comment_lifecycle_and_ownership() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;
    let video = server.publish_video("Commented clip").await;
    let video_id = video["id"].as_str().expect("video id").to_string();

    let response = server
        .client
        .post(server.url(&format!("/api/v1/comments/{}", video_id)))
        .json(&serde_json::json!({"content": "Nice clip"}))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("body");
    let comment_id = body["data"]["id"].as_str().expect("comment id").to_string();

    server.register_user("bob").await;
    let bob = server.new_session();
    login_on(&server, &bob, "bob").await;

    // Bob can read but not edit or delete Alice's comment
    let response = bob
        .get(server.url(&format!("/api/v1/comments/{}", video_id)))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["data"].as_array().expect("list").len(), 1);

    let response = bob
        .patch(server.url(&format!("/api/v1/comments/c/{}", comment_id)))
        .json(&serde_json::json!({"content": "Hijacked"}))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 403);

    let response = bob
        .delete(server.url(&format!("/api/v1/comments/c/{}", comment_id)))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 403);

    // The owner edits and deletes
    let response = server
        .client
        .patch(server.url(&format!("/api/v1/comments/c/{}", comment_id)))
        .json(&serde_json::json!({"content": "Nice clip (edited)"}))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .delete(server.url(&format!("/api/v1/comments/c/{}", comment_id)))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_playlist_membership_is_a_set() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;
    let video = server.publish_video("Playlist clip").await;
    let video_id = video["id"].as_str().expect("video id").to_string();

    let response = server
        .client
        .post(server.url("/api/v1/playlists"))
        .json(&serde_json::json!({"name": "Favourites", "description": "The good ones"}))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("body");
    let playlist_id = body["data"]["id"].as_str().expect("playlist id").to_string();

    // Adding twice is a no-op, not an error
    for _ in 0..2 {
        let response = server
            .client
            .post(server.url(&format!(
                "/api/v1/playlists/{}/videos/{}",
                playlist_id, video_id
            )))
            .send()
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), 200);
    }

    let response = server
        .client
        .get(server.url(&format!("/api/v1/playlists/{}", playlist_id)))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["data"]["videos"].as_array().expect("list").len(), 1);

    // Removal works once; the second attempt reports absence
    let response = server
        .client
        .delete(server.url(&format!(
            "/api/v1/playlists/{}/videos/{}",
            playlist_id, video_id
        )))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .delete(server.url(&format!(
            "/api/v1/playlists/{}/videos/{}",
            playlist_id, video_id
        )))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_playlist_add_requires_owning_both_resources() {
    let server = TestServer::new().await;
    server.register_and_login("alice").await;
    let video = server.publish_video("Alice's clip").await;
    let video_id = video["id"].as_str().expect("video id").to_string();

    server.register_user("bob").await;
    let bob = server.new_session();
    login_on(&server, &bob, "bob").await;

    // Bob's playlist, Alice's video
    let response = bob
        .post(server.url("/api/v1/playlists"))
        .json(&serde_json::json!({"name": "Stolen", "description": "Other people's clips"}))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    let playlist_id = body["data"]["id"].as_str().expect("playlist id").to_string();

    let response = bob
        .post(server.url(&format!(
            "/api/v1/playlists/{}/videos/{}",
            playlist_id, video_id
        )))
        .send()
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_list_videos_pagination() {
    let server = TestServer::new().await;
    let alice = server.register_user("alice").await;
    let alice_id = alice["id"].as_str().expect("alice id").to_string();
    server.login_user("alice").await;

    for i in 0..3 {
        server.publish_video(&format!("Clip {}", i)).await;
    }

    let response = server
        .client
        .get(server.url(&format!("/api/v1/videos/u/{}?page=1&limit=2", alice_id)))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["data"].as_array().expect("list").len(), 2);

    let response = server
        .client
        .get(server.url(&format!("/api/v1/videos/u/{}?page=2&limit=2", alice_id)))
        .send()
        .await
        .expect("request succeeds");
    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["data"].as_array().expect("list").len(), 1);
}
