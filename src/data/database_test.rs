//! Database tests

use super::*;
use chrono::Utc;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn make_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: EntityId::new().0,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: format!("User {}", username),
        password_hash: "$argon2id$test".to_string(),
        avatar_url: format!("https://media.test/avatars/{}.webp", username),
        avatar_key: format!("avatars/{}.webp", username),
        cover_url: None,
        cover_key: None,
        refresh_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn make_video(owner: &User, title: &str) -> Video {
    let id = EntityId::new().0;
    Video {
        id: id.clone(),
        owner_id: owner.id.clone(),
        title: title.to_string(),
        description: "desc".to_string(),
        video_url: format!("https://media.test/videos/{}.mp4", id),
        video_key: format!("videos/{}.mp4", id),
        thumbnail_url: format!("https://media.test/thumbnails/{}.webp", id),
        thumbnail_key: format!("thumbnails/{}.webp", id),
        duration_seconds: 42.5,
        views: 0,
        is_published: true,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_insert_and_lookup_by_identity() {
    let (db, _temp_dir) = create_test_db().await;
    let user = make_user("alice");
    db.insert_user(&user).await.unwrap();

    let by_username = db.get_user_by_identity("alice").await.unwrap().unwrap();
    assert_eq!(by_username.id, user.id);

    let by_email = db
        .get_user_by_identity("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(db.get_user_by_identity("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;
    let user = make_user("alice");
    db.insert_user(&user).await.unwrap();

    let mut dup = make_user("alice");
    dup.email = "other@example.com".to_string();
    let err = db.insert_user(&dup).await.unwrap_err();
    assert!(matches!(err, crate::error::AppError::Conflict(_)));
}

#[tokio::test]
async fn test_like_unique_index_holds_under_duplicate_inserts() {
    let (db, _temp_dir) = create_test_db().await;
    let user = make_user("alice");
    db.insert_user(&user).await.unwrap();
    let video = make_video(&user, "v");
    db.insert_video(&video).await.unwrap();

    let first = db
        .insert_like_if_absent(&user.id, &video.id, LikeTarget::Video)
        .await
        .unwrap();
    let second = db
        .insert_like_if_absent(&user.id, &video.id, LikeTarget::Video)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(
        db.count_likes(&video.id, LikeTarget::Video).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_like_delete_is_actor_scoped() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = make_user("alice");
    let bob = make_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();
    let video = make_video(&alice, "v");
    db.insert_video(&video).await.unwrap();

    db.insert_like_if_absent(&alice.id, &video.id, LikeTarget::Video)
        .await
        .unwrap();
    db.insert_like_if_absent(&bob.id, &video.id, LikeTarget::Video)
        .await
        .unwrap();

    // Bob removing his like must not touch Alice's.
    assert!(db
        .delete_like(&bob.id, &video.id, LikeTarget::Video)
        .await
        .unwrap());
    assert!(db
        .get_like(&alice.id, &video.id, LikeTarget::Video)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_refresh_rotation_is_compare_and_set() {
    let (db, _temp_dir) = create_test_db().await;
    let user = make_user("alice");
    db.insert_user(&user).await.unwrap();

    db.set_refresh_token(&user.id, "token-1").await.unwrap();

    // Rotation with the current value succeeds.
    assert!(db
        .rotate_refresh_token(&user.id, "token-1", "token-2")
        .await
        .unwrap());

    // Replaying the superseded value fails.
    assert!(!db
        .rotate_refresh_token(&user.id, "token-1", "token-3")
        .await
        .unwrap());

    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("token-2"));
}

#[tokio::test]
async fn test_clear_refresh_token() {
    let (db, _temp_dir) = create_test_db().await;
    let user = make_user("alice");
    db.insert_user(&user).await.unwrap();
    db.set_refresh_token(&user.id, "token-1").await.unwrap();

    db.clear_refresh_token(&user.id).await.unwrap();
    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token.is_none());
}

#[tokio::test]
async fn test_playlist_membership_is_a_set() {
    let (db, _temp_dir) = create_test_db().await;
    let user = make_user("alice");
    db.insert_user(&user).await.unwrap();
    let video = make_video(&user, "v");
    db.insert_video(&video).await.unwrap();

    let playlist = Playlist {
        id: EntityId::new().0,
        owner_id: user.id.clone(),
        name: "Favorites".to_string(),
        description: "best of".to_string(),
        created_at: Utc::now(),
    };
    db.insert_playlist(&playlist).await.unwrap();

    db.add_video_to_playlist(&playlist.id, &video.id)
        .await
        .unwrap();
    db.add_video_to_playlist(&playlist.id, &video.id)
        .await
        .unwrap();

    let videos = db.list_playlist_videos(&playlist.id).await.unwrap();
    assert_eq!(videos.len(), 1);
}

#[tokio::test]
async fn test_channel_profile_counts() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = make_user("alice");
    let bob = make_user("bob");
    let carol = make_user("carol");
    let dave = make_user("dave");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();
    db.insert_user(&carol).await.unwrap();
    db.insert_user(&dave).await.unwrap();

    // Three subscribers to alice, alice subscribes to two channels.
    for subscriber in [&bob, &carol, &dave] {
        db.insert_subscription_if_absent(&subscriber.id, &alice.id)
            .await
            .unwrap();
    }
    db.insert_subscription_if_absent(&alice.id, &bob.id)
        .await
        .unwrap();
    db.insert_subscription_if_absent(&alice.id, &carol.id)
        .await
        .unwrap();

    let profile = db
        .channel_profile("alice", &bob.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.subscriber_count, 3);
    assert_eq!(profile.subscribed_to_count, 2);
    assert!(profile.is_subscribed);

    let profile_for_stranger = db
        .channel_profile("alice", "01ARZ3NDEKTSV4RRFFQ69G5FAV")
        .await
        .unwrap()
        .unwrap();
    assert!(!profile_for_stranger.is_subscribed);

    assert!(db.channel_profile("nobody", &bob.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_liked_videos_empty_and_joined() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = make_user("alice");
    let bob = make_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    // Zero likes yields an empty sequence, not an error.
    assert!(db.liked_videos(&alice.id).await.unwrap().is_empty());

    let video = make_video(&bob, "bob's video");
    db.insert_video(&video).await.unwrap();
    db.insert_like_if_absent(&alice.id, &video.id, LikeTarget::Video)
        .await
        .unwrap();

    let liked = db.liked_videos(&alice.id).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].video.id, video.id);
    assert_eq!(liked[0].owner.username, "bob");
    assert_eq!(liked[0].owner.full_name, "User bob");
    // Liked-video feed projects only username and full name.
    assert!(liked[0].owner.avatar_url.is_none());
}

#[tokio::test]
async fn test_watch_history_dedupes_and_orders() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = make_user("alice");
    let bob = make_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();
    let v1 = make_video(&bob, "first");
    let v2 = make_video(&bob, "second");
    db.insert_video(&v1).await.unwrap();
    db.insert_video(&v2).await.unwrap();

    db.record_watch(&alice.id, &v1.id).await.unwrap();
    db.record_watch(&alice.id, &v2.id).await.unwrap();
    // Re-watching v1 bumps it, not duplicates it.
    db.record_watch(&alice.id, &v1.id).await.unwrap();

    let history = db.watch_history(&alice.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].video.id, v1.id);
    assert!(history[0].owner.avatar_url.is_some());
}

#[tokio::test]
async fn test_delete_video_cascades_relations() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = make_user("alice");
    let bob = make_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();
    let video = make_video(&alice, "v");
    db.insert_video(&video).await.unwrap();

    let comment = Comment {
        id: EntityId::new().0,
        video_id: video.id.clone(),
        owner_id: bob.id.clone(),
        content: "nice".to_string(),
        created_at: Utc::now(),
    };
    db.insert_comment(&comment).await.unwrap();
    db.insert_like_if_absent(&bob.id, &video.id, LikeTarget::Video)
        .await
        .unwrap();
    db.insert_like_if_absent(&alice.id, &comment.id, LikeTarget::Comment)
        .await
        .unwrap();
    db.record_watch(&bob.id, &video.id).await.unwrap();

    db.delete_video(&video.id).await.unwrap();

    assert!(db.get_video(&video.id).await.unwrap().is_none());
    assert!(db.get_comment(&comment.id).await.unwrap().is_none());
    assert_eq!(
        db.count_likes(&video.id, LikeTarget::Video).await.unwrap(),
        0
    );
    assert_eq!(
        db.count_likes(&comment.id, LikeTarget::Comment)
            .await
            .unwrap(),
        0
    );
    assert!(db.watch_history(&bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_channel_stats() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = make_user("alice");
    let bob = make_user("bob");
    db.insert_user(&alice).await.unwrap();
    db.insert_user(&bob).await.unwrap();

    let mut v1 = make_video(&alice, "v1");
    v1.views = 10;
    let mut v2 = make_video(&alice, "v2");
    v2.views = 5;
    db.insert_video(&v1).await.unwrap();
    db.insert_video(&v2).await.unwrap();

    db.insert_subscription_if_absent(&bob.id, &alice.id)
        .await
        .unwrap();
    db.insert_like_if_absent(&bob.id, &v1.id, LikeTarget::Video)
        .await
        .unwrap();

    let stats = db.channel_stats(&alice.id).await.unwrap();
    assert_eq!(stats.total_videos, 2);
    assert_eq!(stats.total_views, 15);
    assert_eq!(stats.total_subscribers, 1);
    assert_eq!(stats.total_likes, 1);
}
