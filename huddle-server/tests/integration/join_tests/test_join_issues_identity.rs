use axum::http::{Method, StatusCode};
use huddle_core::utils::default_ice_servers;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_first_join_sees_empty_room() {
    init_tracing();
    let server = TestServer::new();

    let joined = server.join("standup", Some("  Ada   Lovelace ")).await.unwrap();
    assert!(joined.others.is_empty());
    assert_eq!(joined.participant.display_name, "Ada Lovelace");
    assert!(!joined.participant.is_guest);
    assert!(!joined.participant.secret.as_str().is_empty());
    assert_eq!(joined.ice_servers, default_ice_servers());
}

#[tokio::test]
async fn test_second_join_sees_first() {
    init_tracing();
    let server = TestServer::new();

    let a = server.join("standup", Some("A")).await.unwrap();
    let b = server.join("standup", Some("B")).await.unwrap();
    assert_eq!(b.others.len(), 1);
    assert_eq!(b.others[0].id, a.participant.id);
    assert_ne!(a.participant.id, b.participant.id);
}

#[tokio::test]
async fn test_join_never_leaks_secrets() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap();

    let (status, body) = server
        .send(Method::POST, "/rooms/standup/join", Some(json!({})))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    let other = &body["others"][0];
    assert_eq!(other["id"], a.participant.id.as_str());
    assert!(other.get("secret").is_none());
    assert!(body["participant"]["isGuest"].as_bool().unwrap());
    assert!(
        body["participant"]["displayName"]
            .as_str()
            .unwrap()
            .starts_with("Guest ")
    );
}

#[tokio::test]
async fn test_join_without_body() {
    init_tracing();
    let server = TestServer::new();
    let (status, body) = server
        .send(Method::POST, "/rooms/standup/join", None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body["participant"]["isGuest"].as_bool().unwrap());
}

#[tokio::test]
async fn test_health_and_ice_servers() {
    init_tracing();
    let server = TestServer::new();

    let (status, body) = server.send(Method::GET, "/health", None).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = server.send(Method::GET, "/ice-servers", None).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body["iceServers"][0]["urls"][0]
        .as_str()
        .unwrap()
        .starts_with("stun:"));
}
