use async_trait::async_trait;
use huddle_core::engine::{LinkState, PeerLink, SignalingState, TrackSwap};
use huddle_core::error::LinkError;
use huddle_core::media::{LocalMedia, LocalTrack, TrackKind};
use huddle_core::model::{IceCandidate, ParticipantId, SdpType, SessionDescription};
use std::cell::RefCell;
use std::collections::HashMap;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    MediaStreamTrack, RtcIceCandidateInit, RtcPeerConnection, RtcPeerConnectionIceEvent,
    RtcPeerConnectionState, RtcRtpTransceiver, RtcRtpTransceiverDirection, RtcRtpTransceiverInit,
    RtcSdpType, RtcSessionDescriptionInit, RtcSignalingState, RtcTrackEvent,
};

use crate::logger::Logger;
use crate::peer::LocalTracks;
use crate::utils::describe;

fn kind_name(kind: TrackKind) -> &'static str {
    match kind {
        TrackKind::Audio => "audio",
        TrackKind::Video => "video",
    }
}

pub(crate) fn link_state(state: RtcPeerConnectionState) -> Option<LinkState> {
    match state {
        RtcPeerConnectionState::New => Some(LinkState::New),
        RtcPeerConnectionState::Connecting => Some(LinkState::Connecting),
        RtcPeerConnectionState::Connected => Some(LinkState::Connected),
        RtcPeerConnectionState::Disconnected => Some(LinkState::Disconnected),
        RtcPeerConnectionState::Failed => Some(LinkState::Failed),
        RtcPeerConnectionState::Closed => Some(LinkState::Closed),
        _ => None,
    }
}

fn sdp_error(e: JsValue) -> LinkError {
    LinkError::Sdp(describe(&e))
}

fn media_error(e: JsValue) -> LinkError {
    LinkError::Media(describe(&e))
}

/// Handlers installed on the connection, detached when the link drops.
pub(crate) struct LinkCallbacks {
    pub(crate) _state: Closure<dyn FnMut()>,
    pub(crate) _ice: Closure<dyn FnMut(RtcPeerConnectionIceEvent)>,
    pub(crate) _track: Closure<dyn FnMut(RtcTrackEvent)>,
}

/// [`PeerLink`] over the browser's `RTCPeerConnection`.
pub struct BrowserLink {
    remote: ParticipantId,
    pc: RtcPeerConnection,
    tracks: LocalTracks,
    /// The transceiver each kind is sent on.
    transceivers: RefCell<HashMap<TrackKind, RtcRtpTransceiver>>,
    _callbacks: LinkCallbacks,
}

impl BrowserLink {
    pub(crate) fn new(
        remote: ParticipantId,
        pc: RtcPeerConnection,
        tracks: LocalTracks,
        callbacks: LinkCallbacks,
    ) -> Self {
        Self {
            remote,
            pc,
            tracks,
            transceivers: RefCell::new(HashMap::new()),
            _callbacks: callbacks,
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn peer_connection(&self) -> &RtcPeerConnection {
        &self.pc
    }

    /// One sendrecv transceiver per kind, with no track on the sender when
    /// `media` lacks that kind.
    pub(crate) fn attach_media(&self, media: &LocalMedia) -> Result<(), LinkError> {
        for kind in [TrackKind::Audio, TrackKind::Video] {
            let init = RtcRtpTransceiverInit::new();
            init.set_direction(RtcRtpTransceiverDirection::Sendrecv);
            let transceiver = match media.outgoing(kind) {
                Some(track) => {
                    let track = self.media_track(track)?;
                    self.pc
                        .add_transceiver_with_media_stream_track_and_init(&track, &init)
                }
                None => self.pc.add_transceiver_with_str_and_init(kind_name(kind), &init),
            };
            self.transceivers.borrow_mut().insert(kind, transceiver);
        }
        Ok(())
    }

    /// Moves each outgoing sender onto the transceiver the remote offer opened
    /// for its kind.
    ///
    /// Transceivers added before an offer arrives are never matched to the
    /// offer's m-lines, so on the answering side they would stay unnegotiated.
    async fn adopt_offered_transceivers(&self) -> Result<(), LinkError> {
        let all = self.pc.get_transceivers();
        for kind in [TrackKind::Audio, TrackKind::Video] {
            let Some(own) = self.transceivers.borrow().get(&kind).cloned() else {
                continue;
            };
            if own.mid().is_some() {
                continue;
            }
            let offered = all
                .iter()
                .filter_map(|t| t.dyn_into::<RtcRtpTransceiver>().ok())
                .find(|t| t.mid().is_some() && t.receiver().track().kind() == kind_name(kind));
            let Some(offered) = offered else {
                continue;
            };

            offered.set_direction(RtcRtpTransceiverDirection::Sendrecv);
            let track = own.sender().track();
            JsFuture::from(offered.sender().replace_track(track.as_ref()))
                .await
                .map_err(media_error)?;
            own.stop();
            self.transceivers.borrow_mut().insert(kind, offered);
            Logger::debug(&format!(
                "Sending {} to {} on the offered transceiver",
                kind_name(kind),
                self.remote
            ));
        }
        Ok(())
    }

    fn media_track(&self, track: &LocalTrack) -> Result<MediaStreamTrack, LinkError> {
        self.tracks
            .get(track.id())
            .ok_or_else(|| LinkError::Media(format!("unknown local track {}", track.id())))
    }

    /// Installs a freshly created description locally and returns its sdp.
    async fn describe_local(
        &self,
        sdp_type: RtcSdpType,
        created: JsValue,
    ) -> Result<String, LinkError> {
        let sdp = js_sys::Reflect::get(&created, &"sdp".into())
            .map_err(sdp_error)?
            .as_string()
            .ok_or_else(|| LinkError::Sdp("description without sdp".to_string()))?;

        let init = RtcSessionDescriptionInit::new(sdp_type);
        init.set_sdp(&sdp);
        JsFuture::from(self.pc.set_local_description(&init))
            .await
            .map_err(sdp_error)?;
        Ok(sdp)
    }
}

#[async_trait(?Send)]
impl PeerLink for BrowserLink {
    async fn create_offer(&self) -> Result<SessionDescription, LinkError> {
        let offer = JsFuture::from(self.pc.create_offer())
            .await
            .map_err(sdp_error)?;
        let sdp = self.describe_local(RtcSdpType::Offer, offer).await?;
        Ok(SessionDescription::offer(sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, LinkError> {
        let answer = JsFuture::from(self.pc.create_answer())
            .await
            .map_err(sdp_error)?;
        let sdp = self.describe_local(RtcSdpType::Answer, answer).await?;
        Ok(SessionDescription::answer(sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError> {
        let sdp_type = match desc.sdp_type {
            SdpType::Offer => RtcSdpType::Offer,
            SdpType::Answer => RtcSdpType::Answer,
        };
        let init = RtcSessionDescriptionInit::new(sdp_type);
        init.set_sdp(&desc.sdp);
        JsFuture::from(self.pc.set_remote_description(&init))
            .await
            .map_err(sdp_error)?;
        if desc.sdp_type == SdpType::Offer {
            self.adopt_offered_transceivers().await?;
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError> {
        let init = RtcIceCandidateInit::new(&candidate.candidate);
        init.set_sdp_mid(candidate.sdp_mid.as_deref());
        init.set_sdp_m_line_index(candidate.sdp_m_line_index);
        JsFuture::from(
            self.pc
                .add_ice_candidate_with_opt_rtc_ice_candidate_init(Some(&init)),
        )
        .await
        .map(|_| ())
        .map_err(|e| LinkError::Ice(describe(&e)))
    }

    fn signaling_state(&self) -> SignalingState {
        match self.pc.signaling_state() {
            RtcSignalingState::HaveLocalOffer | RtcSignalingState::HaveLocalPranswer => {
                SignalingState::HaveLocalOffer
            }
            RtcSignalingState::HaveRemoteOffer | RtcSignalingState::HaveRemotePranswer => {
                SignalingState::HaveRemoteOffer
            }
            RtcSignalingState::Closed => SignalingState::Closed,
            _ => SignalingState::Stable,
        }
    }

    async fn has_remote_description(&self) -> bool {
        self.pc.remote_description().is_some()
    }

    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Option<&LocalTrack>,
    ) -> Result<TrackSwap, LinkError> {
        let Some(transceiver) = self.transceivers.borrow().get(&kind).cloned() else {
            return Err(LinkError::InvalidState(format!(
                "no {} transceiver",
                kind_name(kind)
            )));
        };
        let replacement = track.map(|t| self.media_track(t)).transpose()?;

        JsFuture::from(transceiver.sender().replace_track(replacement.as_ref()))
            .await
            .map_err(media_error)?;
        Ok(TrackSwap::Replaced)
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.pc.close();
        Ok(())
    }
}

impl Drop for BrowserLink {
    fn drop(&mut self) {
        self.pc.set_onconnectionstatechange(None);
        self.pc.set_onicecandidate(None);
        self.pc.set_ontrack(None);
    }
}
