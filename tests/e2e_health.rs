//! E2E tests for health and metrics endpoints

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("body"), "OK");
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_protected_route_rejects_anonymous() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/v1/users/current-user"))
        .send()
        .await
        .expect("request succeeds");

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.expect("error body");
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 401);
}
