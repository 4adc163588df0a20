use axum::http::StatusCode;
use huddle_core::model::{LeavePayload, Secret, SignalKind};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_leave_is_idempotent() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;

    let (status, body) = server.leave("standup", &a).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, body) = server.leave("standup", &a).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let fetched = server.fetch("standup", &b, 0, None).await.unwrap();
    assert_eq!(fetched.signals.len(), 1, "leave is broadcast exactly once");
    let signal = &fetched.signals[0];
    assert_eq!(signal.kind, SignalKind::Leave);
    assert!(signal.to_participant_id.is_none());
    let payload: LeavePayload = signal.payload_as().unwrap();
    assert_eq!(payload.participant_id, a.id);
}

#[tokio::test]
async fn test_departed_participant_is_locked_out() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;
    server.leave("standup", &a).await.unwrap();

    let listed = server.participants("standup", &b).await.unwrap();
    assert_eq!(listed.participants.len(), 1);

    assert!(server.participants("standup", &a).await.is_err());
    assert!(
        server
            .post("standup", &a, Some(&b.id), SignalKind::Ice, json!({}))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_leave_with_wrong_secret() {
    init_tracing();
    let server = TestServer::new();
    let mut a = server.join("standup", Some("A")).await.unwrap().participant;
    a.secret = Secret::generate();
    let (status, body) = server.leave("standup", &a).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}
