use async_trait::async_trait;
use huddle_core::engine::{LinkEvent, LinkEventSender, PeerConnector};
use huddle_core::error::LinkError;
use huddle_core::media::LocalMedia;
use huddle_core::model::{IceCandidate, IceServerConfig, ParticipantId};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

use crate::error::ClientError;
use crate::peer::{TrackRegistry, WebRtcLink, webrtc_link::link_state};

fn rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

/// Builds webrtc-rs connections for the negotiation engine.
///
/// Connection callbacks only forward into the engine's link event channel;
/// all state changes happen inside the engine.
pub struct WebRtcConnector {
    api: API,
    config: RTCConfiguration,
    tracks: Arc<TrackRegistry>,
}

impl WebRtcConnector {
    pub fn new(
        ice_servers: &[IceServerConfig],
        tracks: Arc<TrackRegistry>,
    ) -> Result<Self, ClientError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(rtc_ice_server).collect(),
            ..Default::default()
        };

        Ok(Self {
            api,
            config,
            tracks,
        })
    }

    pub fn tracks(&self) -> &Arc<TrackRegistry> {
        &self.tracks
    }
}

#[async_trait]
impl PeerConnector for WebRtcConnector {
    type Link = WebRtcLink;

    async fn connect(
        &self,
        remote: &ParticipantId,
        media: &LocalMedia,
        events: LinkEventSender,
    ) -> Result<WebRtcLink, LinkError> {
        let peer_connection = Arc::new(
            self.api
                .new_peer_connection(self.config.clone())
                .await
                .map_err(|e| LinkError::Connection(e.to_string()))?,
        );

        let state_tx = events.clone();
        let uid_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    debug!("Peer connection state for {}: {:?}", uid, s);
                    if let Some(state) = link_state(s) {
                        let _ = tx.unbounded_send(LinkEvent::StateChanged(uid, state));
                    }
                })
            },
        ));

        let ice_tx = events.clone();
        let uid_ice = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to serialize local candidate for {}: {}", uid, e);
                        return;
                    }
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.unbounded_send(LinkEvent::CandidateGenerated(uid, candidate));
            })
        }));

        let uid_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let uid = uid_track.clone();
                Box::pin(async move {
                    info!("Receiving {} track from {}", track.kind(), uid);
                })
            },
        ));

        let link = WebRtcLink::new(remote.clone(), peer_connection, self.tracks.clone());
        if let Err(e) = link.attach_media(media).await {
            let _ = link.peer_connection().close().await;
            return Err(e);
        }
        Ok(link)
    }
}
