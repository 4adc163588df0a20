use huddle_core::engine::{LinkState, SignalTransport};
use huddle_core::media::{LocalMedia, LocalTrack, TrackKind};
use huddle_core::{PeerEvent, RemovalReason};
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{LocalTransport, TestCall, settle};

#[tokio::test]
async fn test_leave_tears_down_the_remote_side() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mic = LocalTrack::new("mic-a", TrackKind::Audio);
    let media = LocalMedia {
        audio: Some(mic.clone()),
        ..LocalMedia::none()
    };
    let mut a = TestCall::join(&transport, "standup", "A", media).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;
    // Connected peers survive the presence poll, so only `leave` removes A.
    b.link_to(&a).unwrap().emit_state(LinkState::Connected);
    b.step().await?;
    b.drain_events();

    // What `CallSession::leave` does once the poller has stopped.
    a.poller.engine_mut().close_all().await;
    transport.leave(a.poller.engine().credentials()).await?;
    assert!(!mic.is_enabled());
    assert!(a.link_to(&b).unwrap().is_closed());

    b.step().await?;
    assert!(b.peer_ids().is_empty());
    assert!(b.link_to(&a).unwrap().is_closed());
    assert_eq!(
        b.drain_events(),
        vec![PeerEvent::Removed(a.id().clone(), RemovalReason::Left)]
    );

    // Leaving again is accepted and broadcasts nothing new.
    transport.leave(a.poller.engine().credentials()).await?;
    let cursor = b.poller.cursor();
    b.step().await?;
    assert_eq!(b.poller.cursor(), cursor);
    assert_eq!(b.connector.links().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_connection_is_rebuilt_from_presence() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;
    a.drain_events();

    let first = a.link_to(&b).unwrap();
    first.emit_state(LinkState::Failed);
    a.step().await?;

    assert!(first.is_closed());
    let events = a.drain_events();
    assert_eq!(
        events[0],
        PeerEvent::Removed(b.id().clone(), RemovalReason::ConnectionLost(LinkState::Failed))
    );
    // The same round's presence poll rediscovers the peer.
    assert_eq!(events[1], PeerEvent::Added(b.id().clone()));
    let second = a.link_to(&b).unwrap();
    assert!(!second.is_closed());
    assert_eq!(a.connector.links().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_revoked_credentials_stop_the_poller() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;

    transport.leave(a.poller.engine().credentials()).await?;
    let err = a.poller.step().await.unwrap_err();
    assert!(err.is_unauthorized());
    Ok(())
}
