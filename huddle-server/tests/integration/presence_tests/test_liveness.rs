use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test(start_paused = true)]
async fn test_silent_participant_drops_out() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;

    let listed = server.participants("standup", &a).await.unwrap();
    assert_eq!(listed.participants.len(), 2);
    assert_eq!(listed.participants[0].id, a.id);
    assert_eq!(listed.participants[1].id, b.id);

    // A keeps polling, B goes quiet.
    for _ in 0..4 {
        tokio::time::advance(Duration::from_secs(10)).await;
        server.participants("standup", &a).await.unwrap();
    }

    let listed = server.participants("standup", &a).await.unwrap();
    let ids: Vec<_> = listed.participants.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec![a.id.clone()]);

    let c = server.join("standup", Some("C")).await.unwrap();
    assert_eq!(c.others.len(), 1);
    assert_eq!(c.others[0].id, a.id);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_counts_as_heartbeat() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;

    for _ in 0..4 {
        tokio::time::advance(Duration::from_secs(10)).await;
        server.fetch("standup", &b, 0, None).await.unwrap();
    }

    let listed = server.participants("standup", &a).await.unwrap();
    assert_eq!(listed.participants.len(), 2);
}
