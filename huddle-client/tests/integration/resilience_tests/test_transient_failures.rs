use huddle_core::media::LocalMedia;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{LocalTransport, TestCall, settle};

#[tokio::test]
async fn test_failed_polls_keep_peers_and_recover() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;

    transport.set_offline(true);
    settle(&mut [&mut a, &mut b], 3).await?;
    assert_eq!(a.poller.cursor(), 0);
    // B met A at join time; nothing was torn down while offline.
    assert_eq!(b.peer_ids(), vec![a.id().clone()]);
    assert!(b.drain_events().iter().all(|e| !matches!(e, huddle_core::PeerEvent::Removed(..))));

    transport.set_offline(false);
    settle(&mut [&mut a, &mut b], 4).await?;
    assert!(a.is_stable_with(&b));
    assert!(b.is_stable_with(&a));
    Ok(())
}
