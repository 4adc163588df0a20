use huddle_core::election;
use huddle_core::media::LocalMedia;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{LocalTransport, TestCall, settle};

#[tokio::test]
async fn test_three_participants_form_a_full_mesh() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    let mut c = TestCall::join(&transport, "standup", "C", LocalMedia::none()).await?;
    assert_eq!(c.others_at_join.len(), 2);

    settle(&mut [&mut a, &mut b, &mut c], 4).await?;

    let calls = [&a, &b, &c];
    for x in calls {
        assert_eq!(x.peer_ids().len(), 2);
        for y in calls {
            if x.id() == y.id() {
                continue;
            }
            assert!(x.is_stable_with(y));
            // Exactly one offer per pair, from the elected side.
            let offers = x.link_to(y).unwrap().offers_created();
            let expected = usize::from(election::is_offerer(x.id(), y.id()));
            assert_eq!(offers, expected);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_rooms_do_not_see_each_other() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "retro", "B", LocalMedia::none()).await?;
    assert!(b.others_at_join.is_empty());

    settle(&mut [&mut a, &mut b], 3).await?;
    assert!(a.peer_ids().is_empty());
    assert!(b.peer_ids().is_empty());
    assert!(a.connector.links().is_empty());
    Ok(())
}
