use huddle_core::PeerEvent;
use huddle_core::engine::LinkState;
use huddle_core::media::LocalMedia;
use huddle_core::model::wire::FetchQuery;
use huddle_core::model::{RoomId, SdpType, SignalKind};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{LocalTransport, TestCall, roles, settle};

#[tokio::test]
async fn test_standup_offer_answer_reaches_stable() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let room = RoomId::parse("standup")?;

    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    assert!(a.others_at_join.is_empty());
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    assert_eq!(b.others_at_join.len(), 1);
    assert_eq!(b.others_at_join[0].id, *a.id());

    let (offerer, answerer) = roles(&mut a, &mut b);
    offerer.step().await?;

    // The offer is the first and only entry of the room's log.
    let inbox = transport.rooms().fetch(
        &room,
        &FetchQuery {
            participant_id: answerer.id().clone(),
            secret: answerer.identity.secret.clone(),
            after_seq: 0,
            limit: None,
        },
    )?;
    assert_eq!(inbox.signals.len(), 1);
    assert_eq!(inbox.signals[0].seq, 1);
    assert_eq!(inbox.signals[0].kind, SignalKind::Offer);
    assert_eq!(inbox.signals[0].from_participant_id, *offerer.id());

    answerer.step().await?;
    assert_eq!(answerer.poller.cursor(), 1);
    offerer.step().await?;
    assert_eq!(offerer.poller.cursor(), 2);

    assert!(offerer.is_stable_with(answerer));
    assert!(answerer.is_stable_with(offerer));

    let offerer_link = offerer.link_to(answerer).unwrap();
    let answerer_link = answerer.link_to(offerer).unwrap();
    assert_eq!(offerer_link.offers_created(), 1);
    assert_eq!(answerer_link.offers_created(), 0);
    assert_eq!(
        offerer_link.remote_description().map(|d| d.sdp_type),
        Some(SdpType::Answer)
    );
    assert_eq!(
        answerer_link.remote_description().map(|d| d.sdp_type),
        Some(SdpType::Offer)
    );
    Ok(())
}

#[tokio::test]
async fn test_connected_links_are_reported_once() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;

    a.link_to(&b).unwrap().emit_state(LinkState::Connecting);
    a.link_to(&b).unwrap().emit_state(LinkState::Connected);
    b.link_to(&a).unwrap().emit_state(LinkState::Connected);
    settle(&mut [&mut a, &mut b], 1).await?;

    assert_eq!(
        a.drain_events(),
        vec![
            PeerEvent::Added(b.id().clone()),
            PeerEvent::Connected(b.id().clone())
        ]
    );
    assert_eq!(
        b.drain_events(),
        vec![
            PeerEvent::Added(a.id().clone()),
            PeerEvent::Connected(a.id().clone())
        ]
    );

    // Further rounds with nothing new keep the pair as it is.
    settle(&mut [&mut a, &mut b], 3).await?;
    assert!(a.drain_events().is_empty());
    let offers = a.link_to(&b).unwrap().offers_created() + b.link_to(&a).unwrap().offers_created();
    assert_eq!(offers, 1);
    Ok(())
}
