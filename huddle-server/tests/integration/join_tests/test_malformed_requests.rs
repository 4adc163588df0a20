use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_invalid_json_body_is_bad_request() {
    init_tracing();
    let server = TestServer::new();
    let (status, body) = server
        .send(Method::POST, "/rooms/standup/signal", Some(json!({ "kind": "offer" })))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_missing_query_is_bad_request() {
    init_tracing();
    let server = TestServer::new();
    server.join("standup", None).await.unwrap();
    let (status, body) = server
        .send(Method::GET, "/rooms/standup/participants", None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_overlong_room_id_is_bad_request() {
    init_tracing();
    let server = TestServer::new();
    let uri = format!("/rooms/{}/join", "r".repeat(200));
    let (status, body) = server.send(Method::POST, &uri, None).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    init_tracing();
    let server = TestServer::new();
    let (status, body) = server.send(Method::GET, "/nowhere", None).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
