use huddle_core::election;
use huddle_core::model::{IssuedIdentity, SessionDescription, SignalKind};

use crate::integration::init_tracing;
use crate::utils::{TestServer, to_json};

/// Orders two identities as (offerer, answerer).
fn roles(x: IssuedIdentity, y: IssuedIdentity) -> (IssuedIdentity, IssuedIdentity) {
    if election::is_offerer(&x.id, &y.id) {
        (x, y)
    } else {
        (y, x)
    }
}

#[tokio::test]
async fn test_offer_answer_and_leave_through_the_mailbox() {
    init_tracing();
    let server = TestServer::new();

    let first = server.join("standup", Some("A")).await.unwrap();
    assert!(first.others.is_empty());
    let second = server.join("standup", Some("B")).await.unwrap();
    assert_eq!(second.others.len(), 1);

    let (offerer, answerer) = roles(first.participant, second.participant);

    let offer = to_json(&SessionDescription::offer("v=0 offer")).unwrap();
    let posted = server
        .post("standup", &offerer, Some(&answerer.id), SignalKind::Offer, offer)
        .await
        .unwrap();
    assert_eq!(posted.seq, 1);

    let inbox = server.fetch("standup", &answerer, 0, None).await.unwrap();
    assert_eq!(inbox.signals.len(), 1);
    assert_eq!(inbox.signals[0].seq, 1);
    assert_eq!(inbox.signals[0].kind, SignalKind::Offer);
    let received: SessionDescription = inbox.signals[0].payload_as().unwrap();
    assert_eq!(received.sdp, "v=0 offer");

    let answer = to_json(&SessionDescription::answer("v=0 answer")).unwrap();
    let posted = server
        .post("standup", &answerer, Some(&offerer.id), SignalKind::Answer, answer)
        .await
        .unwrap();
    assert_eq!(posted.seq, 2);

    let inbox = server.fetch("standup", &offerer, 0, None).await.unwrap();
    assert_eq!(inbox.signals.len(), 1);
    assert_eq!(inbox.signals[0].seq, 2);
    assert_eq!(inbox.signals[0].kind, SignalKind::Answer);

    server.leave("standup", &answerer).await.unwrap();
    let inbox = server
        .fetch("standup", &offerer, inbox.next_after_seq, None)
        .await
        .unwrap();
    assert_eq!(inbox.signals.len(), 1);
    assert_eq!(inbox.signals[0].seq, 3);
    assert_eq!(inbox.signals[0].kind, SignalKind::Leave);
    assert_eq!(inbox.signals[0].from_participant_id, answerer.id);
}
