use huddle_client::MediaCommand;
use huddle_core::media::{LocalMedia, LocalTrack, TrackKind};
use huddle_core::model::SdpType;
use std::sync::Arc;

use crate::integration::init_tracing;
use crate::utils::{LocalTransport, TestCall, roles, settle};

fn with_camera(id: &str) -> (LocalMedia, LocalTrack) {
    let camera = LocalTrack::new(id, TrackKind::Video);
    let media = LocalMedia {
        camera: Some(camera.clone()),
        ..LocalMedia::none()
    };
    (media, camera)
}

#[tokio::test]
async fn test_screen_share_swaps_the_video_sender_without_signaling() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let (media, _camera) = with_camera("camera-a");
    let mut a = TestCall::join(&transport, "standup", "A", media).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;

    let link = a.link_to(&b).unwrap();
    let offers_before = link.offers_created() + b.link_to(&a).unwrap().offers_created();
    assert_eq!(link.sending(TrackKind::Video), Some(Some("camera-a".to_string())));

    let screen = LocalTrack::new("screen-a", TrackKind::Video);
    a.commands
        .unbounded_send(MediaCommand::StartScreenShare(screen.clone()))?;
    settle(&mut [&mut a, &mut b], 2).await?;
    assert_eq!(link.sending(TrackKind::Video), Some(Some("screen-a".to_string())));

    a.commands.unbounded_send(MediaCommand::StopScreenShare)?;
    settle(&mut [&mut a, &mut b], 2).await?;
    assert_eq!(link.sending(TrackKind::Video), Some(Some("camera-a".to_string())));
    assert!(!screen.is_enabled());

    let offers_after = link.offers_created() + b.link_to(&a).unwrap().offers_created();
    assert_eq!(offers_before, offers_after);
    assert!(a.is_stable_with(&b));
    Ok(())
}

#[tokio::test]
async fn test_mute_never_renegotiates() -> anyhow::Result<()> {
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

    a.commands
        .unbounded_send(MediaCommand::SetMuted(TrackKind::Audio, true))?;
    settle(&mut [&mut a, &mut b], 2).await?;

    assert!(!mic.is_enabled());
    let link = a.link_to(&b).unwrap();
    assert_eq!(link.sending(TrackKind::Audio), Some(Some("mic-a".to_string())));
    assert_eq!(
        link.offers_created() + b.link_to(&a).unwrap().offers_created(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_late_microphone_renegotiates_from_the_offerer() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join_receive_only(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join_receive_only(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;

    let (offerer, answerer) = roles(&mut a, &mut b);
    offerer.commands.unbounded_send(MediaCommand::AttachTrack(LocalTrack::new(
        "late-mic",
        TrackKind::Audio,
    )))?;
    settle(&mut [&mut *offerer, &mut *answerer], 3).await?;

    let offerer_link = offerer.link_to(answerer).unwrap();
    let answerer_link = answerer.link_to(offerer).unwrap();
    assert_eq!(offerer_link.offers_created(), 2);
    assert_eq!(
        offerer_link.sending(TrackKind::Audio),
        Some(Some("late-mic".to_string()))
    );
    let remote = answerer_link.remote_description().unwrap();
    assert_eq!(remote.sdp_type, SdpType::Offer);
    assert!(remote.sdp.ends_with("-2"));
    assert!(offerer.is_stable_with(answerer));
    assert!(answerer.is_stable_with(offerer));
    assert!(!offerer.renegotiation_pending_with(answerer));
    Ok(())
}

#[tokio::test]
async fn test_late_camera_on_the_answerer_uses_its_idle_sender() -> anyhow::Result<()> {
    init_tracing();
    let transport = Arc::new(LocalTransport::new());
    let mut a = TestCall::join(&transport, "standup", "A", LocalMedia::none()).await?;
    let mut b = TestCall::join(&transport, "standup", "B", LocalMedia::none()).await?;
    settle(&mut [&mut a, &mut b], 3).await?;

    let (offerer, answerer) = roles(&mut a, &mut b);
    let answerer_link = answerer.link_to(offerer).unwrap();
    assert_eq!(answerer_link.sending(TrackKind::Video), Some(None));

    answerer.commands.unbounded_send(MediaCommand::AttachTrack(LocalTrack::new(
        "late-cam",
        TrackKind::Video,
    )))?;
    settle(&mut [&mut *offerer, &mut *answerer], 5).await?;

    assert_eq!(
        answerer_link.sending(TrackKind::Video),
        Some(Some("late-cam".to_string()))
    );
    assert!(!answerer.renegotiation_pending_with(offerer));
    assert_eq!(offerer.link_to(answerer).unwrap().offers_created(), 1);
    assert!(offerer.is_stable_with(answerer));
    assert!(answerer.is_stable_with(offerer));
    Ok(())
}
