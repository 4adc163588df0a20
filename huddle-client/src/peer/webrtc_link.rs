use async_trait::async_trait;
use huddle_core::engine::{LinkState, PeerLink, SignalingState, TrackSwap};
use huddle_core::error::LinkError;
use huddle_core::media::{LocalMedia, LocalTrack, TrackKind};
use huddle_core::model::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::peer::TrackRegistry;

pub(crate) fn codec_type(kind: TrackKind) -> RTPCodecType {
    match kind {
        TrackKind::Audio => RTPCodecType::Audio,
        TrackKind::Video => RTPCodecType::Video,
    }
}

pub(crate) fn signaling_state(state: RTCSignalingState) -> SignalingState {
    match state {
        RTCSignalingState::HaveLocalOffer | RTCSignalingState::HaveLocalPranswer => {
            SignalingState::HaveLocalOffer
        }
        RTCSignalingState::HaveRemoteOffer | RTCSignalingState::HaveRemotePranswer => {
            SignalingState::HaveRemoteOffer
        }
        RTCSignalingState::Closed => SignalingState::Closed,
        RTCSignalingState::Stable | RTCSignalingState::Unspecified => SignalingState::Stable,
    }
}

pub(crate) fn link_state(state: RTCPeerConnectionState) -> Option<LinkState> {
    match state {
        RTCPeerConnectionState::New => Some(LinkState::New),
        RTCPeerConnectionState::Connecting => Some(LinkState::Connecting),
        RTCPeerConnectionState::Connected => Some(LinkState::Connected),
        RTCPeerConnectionState::Disconnected => Some(LinkState::Disconnected),
        RTCPeerConnectionState::Failed => Some(LinkState::Failed),
        RTCPeerConnectionState::Closed => Some(LinkState::Closed),
        RTCPeerConnectionState::Unspecified => None,
    }
}

fn sdp_error(e: webrtc::Error) -> LinkError {
    LinkError::Sdp(e.to_string())
}

fn media_error(e: webrtc::Error) -> LinkError {
    LinkError::Media(e.to_string())
}

/// [`PeerLink`] over a webrtc-rs peer connection.
pub struct WebRtcLink {
    remote: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
    tracks: Arc<TrackRegistry>,
    /// One sender per kind, idle while no track is attached.
    senders: Mutex<HashMap<TrackKind, Arc<RTCRtpSender>>>,
}

impl WebRtcLink {
    pub(crate) fn new(
        remote: ParticipantId,
        peer_connection: Arc<RTCPeerConnection>,
        tracks: Arc<TrackRegistry>,
    ) -> Self {
        Self {
            remote,
            peer_connection,
            tracks,
            senders: Mutex::new(HashMap::new()),
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    /// Sends every outgoing track in `media`. Missing kinds get a sendrecv
    /// transceiver that stays silent until a track is swapped in.
    pub(crate) async fn attach_media(&self, media: &LocalMedia) -> Result<(), LinkError> {
        for kind in [TrackKind::Audio, TrackKind::Video] {
            match media.outgoing(kind) {
                Some(track) => {
                    self.add_sender(kind, track).await?;
                }
                None => {
                    let transceiver = self
                        .peer_connection
                        .add_transceiver_from_kind(
                            codec_type(kind),
                            Some(RTCRtpTransceiverInit {
                                direction: RTCRtpTransceiverDirection::Sendrecv,
                                send_encodings: vec![],
                            }),
                        )
                        .await
                        .map_err(media_error)?;
                    // The sender starts with a placeholder track that never
                    // gets samples, so it is already bound once negotiated.
                    let sender = transceiver.sender().await;
                    self.senders.lock().await.insert(kind, sender);
                }
            }
        }
        Ok(())
    }

    fn sample_track(&self, track: &LocalTrack) -> Result<Arc<TrackLocalStaticSample>, LinkError> {
        self.tracks
            .get(track.id())
            .ok_or_else(|| LinkError::Media(format!("unknown local track {}", track.id())))
    }

    async fn add_sender(&self, kind: TrackKind, track: &LocalTrack) -> Result<(), LinkError> {
        let sample_track = self.sample_track(track)?;
        let sender = self
            .peer_connection
            .add_track(sample_track as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(media_error)?;
        self.senders.lock().await.insert(kind, sender);
        Ok(())
    }
}

#[async_trait]
impl PeerLink for WebRtcLink {
    async fn create_offer(&self) -> Result<SessionDescription, LinkError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(sdp_error)?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(sdp_error)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, LinkError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(sdp_error)?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(sdp_error)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError> {
        let desc = match desc.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
            SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        }
        .map_err(sdp_error)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(sdp_error)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| LinkError::Ice(e.to_string()))
    }

    fn signaling_state(&self) -> SignalingState {
        signaling_state(self.peer_connection.signaling_state())
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Option<&LocalTrack>,
    ) -> Result<TrackSwap, LinkError> {
        let existing = self.senders.lock().await.get(&kind).cloned();

        let Some(sender) = existing else {
            let Some(track) = track else {
                return Ok(TrackSwap::Replaced);
            };
            self.add_sender(kind, track).await?;
            debug!("Added {:?} sender for {}", kind, self.remote);
            return Ok(TrackSwap::NeedsRenegotiation);
        };

        let replacement = match track {
            Some(track) => Some(self.sample_track(track)? as Arc<dyn TrackLocal + Send + Sync>),
            None => None,
        };
        sender
            .replace_track(replacement)
            .await
            .map_err(media_error)?;
        Ok(TrackSwap::Replaced)
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.peer_connection
            .close()
            .await
            .map_err(|e| LinkError::Connection(e.to_string()))
    }
}
