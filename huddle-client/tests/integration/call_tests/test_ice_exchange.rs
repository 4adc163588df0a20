use huddle_core::media::LocalMedia;
use huddle_core::model::IceCandidate;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{LocalTransport, TestCall, roles, settle};

fn candidate(n: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{n} 1 udp 2122260223 10.0.0.{n} 5000{n} typ host"),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
    }
}

#[tokio::test]
async fn test_candidates_before_the_answer_are_buffered_in_order() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    let (offerer, answerer) = roles(&mut a, &mut b);

    offerer.step().await?;
    // Creates the answerer's connection without touching the mailbox yet.
    answerer.poller.poll_participants().await?;
    let answerer_link = answerer.link_to(offerer).unwrap();
    answerer_link.generate_candidate(candidate(1));
    answerer_link.generate_candidate(candidate(2));

    // Candidates go out first, then the answer: the offerer sees them
    // before it has a remote description.
    answerer.step().await?;
    offerer.step().await?;

    let offerer_link = offerer.link_to(answerer).unwrap();
    assert!(offerer.is_stable_with(answerer));
    assert_eq!(offerer_link.applied_ice(), vec![candidate(1), candidate(2)]);
    assert_eq!(
        offerer
            .poller
            .engine()
            .peer(answerer.id())
            .map(|peer| peer.pending_ice_len()),
        Some(0)
    );
    Ok(())
}

#[tokio::test]
async fn test_candidates_after_negotiation_apply_directly() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;

    a.link_to(&b).unwrap().generate_candidate(candidate(7));
    b.link_to(&a).unwrap().generate_candidate(candidate(8));
    settle(&mut [&mut a, &mut b], 2).await?;

    assert_eq!(b.link_to(&a).unwrap().applied_ice(), vec![candidate(7)]);
    assert_eq!(a.link_to(&b).unwrap().applied_ice(), vec![candidate(8)]);
    Ok(())
}
