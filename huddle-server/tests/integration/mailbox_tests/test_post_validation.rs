use axum::http::{Method, StatusCode};
use huddle_core::model::{ParticipantId, Secret, SignalKind};
use huddle_server::Config;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let mut b = server.join("standup", Some("B")).await.unwrap().participant;
    b.secret = Secret::generate();

    let body = TestServer::signal_body(&b, Some(&a.id), SignalKind::Offer, json!({})).unwrap();
    let (status, body) = server
        .send(Method::POST, "/rooms/standup/signal", Some(body))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let err = server.fetch("standup", &b, 0, None).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_credentials_are_room_scoped() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    server.join("retro", Some("B")).await.unwrap();

    let err = server.participants("retro", &a).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_unicast_kinds_need_a_known_recipient() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;
    let stranger = ParticipantId::generate();

    for (to, kind) in [
        (None, SignalKind::Offer),
        (None, SignalKind::Answer),
        (None, SignalKind::Ice),
        (Some(&stranger), SignalKind::Ice),
        (Some(&b.id), SignalKind::Answer),
    ] {
        let body = TestServer::signal_body(&b, to, kind, json!({})).unwrap();
        let (status, body) = server
            .send(Method::POST, "/rooms/standup/signal", Some(body))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST, "{:?} to {:?}", kind, to);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    let posted = server
        .post("standup", &a, None, SignalKind::Leave, json!({ "participantId": a.id }))
        .await
        .unwrap();
    assert_eq!(posted.seq, 1);
}

#[tokio::test]
async fn test_oversized_payload_is_rejected() {
    init_tracing();
    let server = TestServer::with_config(Config {
        max_payload_bytes: 1024,
        ..Config::default()
    });
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;

    let body = TestServer::signal_body(
        &b,
        Some(&a.id),
        SignalKind::Offer,
        json!({ "type": "offer", "sdp": "a".repeat(4096) }),
    )
    .unwrap();
    let (status, body) = server
        .send(Method::POST, "/rooms/standup/signal", Some(body))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    let fetched = server.fetch("standup", &a, 0, None).await.unwrap();
    assert!(fetched.signals.is_empty());
}
