use huddle_core::model::SignalKind;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_seqs_are_unique_and_increasing() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;

    let mut last = 0;
    for n in 0..20 {
        let (from, to) = if n % 2 == 0 { (&a, &b) } else { (&b, &a) };
        let posted = server
            .post("standup", from, Some(&to.id), SignalKind::Ice, json!({ "candidate": n }))
            .await
            .unwrap();
        assert!(posted.ok);
        assert_eq!(posted.seq, last + 1);
        last = posted.seq;
    }
}

#[tokio::test]
async fn test_fetch_never_goes_backwards() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;

    for n in 0..5 {
        server
            .post("standup", &b, Some(&a.id), SignalKind::Ice, json!({ "candidate": n }))
            .await
            .unwrap();
    }

    let first = server.fetch("standup", &a, 0, Some(3)).await.unwrap();
    let seqs: Vec<u64> = first.signals.iter().map(|s| s.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(first.next_after_seq, 3);

    let repeat = server.fetch("standup", &a, 0, Some(3)).await.unwrap();
    assert_eq!(repeat.signals, first.signals);

    let second = server
        .fetch("standup", &a, first.next_after_seq, None)
        .await
        .unwrap();
    assert!(second.signals.iter().all(|s| s.seq > first.next_after_seq));
    assert_eq!(second.signals.len(), 2);
    assert_eq!(second.next_after_seq, 5);

    let drained = server.fetch("standup", &a, 5, None).await.unwrap();
    assert!(drained.signals.is_empty());
    assert_eq!(drained.next_after_seq, 5);
}

#[tokio::test]
async fn test_signals_for_others_advance_cursor() {
    init_tracing();
    let server = TestServer::new();
    let a = server.join("standup", Some("A")).await.unwrap().participant;
    let b = server.join("standup", Some("B")).await.unwrap().participant;
    let c = server.join("standup", Some("C")).await.unwrap().participant;

    server
        .post("standup", &b, Some(&c.id), SignalKind::Offer, json!({ "type": "offer", "sdp": "x" }))
        .await
        .unwrap();
    server
        .post("standup", &a, Some(&c.id), SignalKind::Offer, json!({ "type": "offer", "sdp": "y" }))
        .await
        .unwrap();

    let for_a = server.fetch("standup", &a, 0, None).await.unwrap();
    assert!(for_a.signals.is_empty());
    assert_eq!(for_a.next_after_seq, 2);

    let for_c = server.fetch("standup", &c, 0, None).await.unwrap();
    assert_eq!(for_c.signals.len(), 2);
    assert_eq!(for_c.signals[0].from_participant_id, b.id);
    assert_eq!(for_c.signals[1].from_participant_id, a.id);
}
