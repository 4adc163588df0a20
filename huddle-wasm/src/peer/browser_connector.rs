use async_trait::async_trait;
use huddle_core::engine::{LinkEvent, LinkEventSender, PeerConnector};
use huddle_core::error::LinkError;
use huddle_core::media::LocalMedia;
use huddle_core::model::{IceCandidate, IceServerConfig, ParticipantId};
use huddle_core::utils::default_ice_servers;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::{RtcPeerConnection, RtcPeerConnectionIceEvent, RtcTrackEvent};

use crate::events::EventSink;
use crate::logger::Logger;
use crate::peer::browser_link::{LinkCallbacks, link_state};
use crate::peer::{BrowserLink, LocalTracks};
use crate::utils::describe;

/// Builds `RTCPeerConnection`s for the negotiation engine. Remote tracks go
/// straight to the page through the [`EventSink`].
pub struct BrowserConnector {
    ice_servers: Vec<IceServerConfig>,
    tracks: LocalTracks,
    sink: EventSink,
}

impl BrowserConnector {
    /// An empty server list falls back to the public STUN entry.
    pub fn new(ice_servers: Vec<IceServerConfig>, tracks: LocalTracks, sink: EventSink) -> Self {
        let ice_servers = if ice_servers.is_empty() {
            default_ice_servers()
        } else {
            ice_servers
        };
        Self {
            ice_servers,
            tracks,
            sink,
        }
    }

    fn create_pc(&self) -> Result<RtcPeerConnection, JsValue> {
        let rtc_config = web_sys::RtcConfiguration::new();
        let ice_servers_arr = js_sys::Array::new();

        for server_config in &self.ice_servers {
            let rtc_ice_server = web_sys::RtcIceServer::new();

            let urls = js_sys::Array::new();
            for url in &server_config.urls {
                urls.push(&JsValue::from_str(url));
            }
            rtc_ice_server.set_urls(&urls);

            if let Some(username) = &server_config.username {
                rtc_ice_server.set_username(username);
            }
            if let Some(credential) = &server_config.credential {
                rtc_ice_server.set_credential(credential);
            }

            ice_servers_arr.push(&rtc_ice_server);
        }
        rtc_config.set_ice_servers(&ice_servers_arr);

        RtcPeerConnection::new_with_configuration(&rtc_config)
    }
}

#[async_trait(?Send)]
impl PeerConnector for BrowserConnector {
    type Link = BrowserLink;

    async fn connect(
        &self,
        remote: &ParticipantId,
        media: &LocalMedia,
        events: LinkEventSender,
    ) -> Result<BrowserLink, LinkError> {
        let pc = self
            .create_pc()
            .map_err(|e| LinkError::Connection(describe(&e)))?;

        let state_pc = pc.clone();
        let state_tx = events.clone();
        let uid_state = remote.clone();
        let onstate = Closure::wrap(Box::new(move || {
            if let Some(state) = link_state(state_pc.connection_state()) {
                let event = LinkEvent::StateChanged(uid_state.clone(), state);
                let _ = state_tx.unbounded_send(event);
            }
        }) as Box<dyn FnMut()>);
        pc.set_onconnectionstatechange(Some(onstate.as_ref().unchecked_ref()));

        let ice_tx = events;
        let uid_ice = remote.clone();
        let onice = Closure::wrap(Box::new(move |ev: RtcPeerConnectionIceEvent| {
            if let Some(candidate) = ev.candidate() {
                let candidate = IceCandidate {
                    candidate: candidate.candidate(),
                    sdp_mid: candidate.sdp_mid(),
                    sdp_m_line_index: candidate.sdp_m_line_index(),
                };
                let event = LinkEvent::CandidateGenerated(uid_ice.clone(), candidate);
                let _ = ice_tx.unbounded_send(event);
            }
        }) as Box<dyn FnMut(RtcPeerConnectionIceEvent)>);
        pc.set_onicecandidate(Some(onice.as_ref().unchecked_ref()));

        let sink = self.sink.clone();
        let uid_track = remote.clone();
        let ontrack = Closure::wrap(Box::new(move |ev: RtcTrackEvent| {
            let track = ev.track();
            Logger::info(&format!("Receiving {} track from {}", track.kind(), uid_track));
            sink.track(&uid_track, track, ev.streams());
        }) as Box<dyn FnMut(RtcTrackEvent)>);
        pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));

        let link = BrowserLink::new(
            remote.clone(),
            pc,
            self.tracks.clone(),
            LinkCallbacks {
                _state: onstate,
                _ice: onice,
                _track: ontrack,
            },
        );
        if let Err(e) = link.attach_media(media) {
            link.peer_connection().close();
            return Err(e);
        }
        Ok(link)
    }
}
