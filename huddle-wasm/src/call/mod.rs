//! The exported call handle.
//!
//! A `spawn_local` loop owns the negotiation engine; the handle only talks to
//! it through a command channel, the same way the native poller is driven.

use futures::channel::{mpsc, oneshot};
use huddle_core::NegotiationEngine;
use huddle_core::engine::SignalTransport;
use huddle_core::media::{LocalTrack, TrackKind};
use huddle_core::model::{Credentials, IssuedIdentity, RoomId};
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise, spawn_local};
use web_sys::{MediaStream, MediaStreamTrack};

use crate::events::EventSink;
use crate::logger::Logger;
use crate::peer::{BrowserConnector, LocalTracks};
use crate::transport::FetchTransport;
use crate::utils::to_js;

mod call_loop_impl;

use call_loop_impl::CallLoop;

pub const PARTICIPANTS_INTERVAL_MS: f64 = 2500.0;
pub const SIGNALS_INTERVAL_MS: i32 = 750;
pub const FETCH_LIMIT: u32 = 100;

#[derive(Debug)]
pub(crate) enum MediaCommand {
    SetMuted(TrackKind, bool),
    StartScreenShare(LocalTrack),
    /// `Some(id)` only stops that share, so a stale `ended` event from an
    /// earlier capture cannot end a newer one.
    StopScreenShare(Option<String>),
    AttachTrack(LocalTrack),
}

#[derive(Debug)]
pub(crate) enum CallCommand {
    Media(MediaCommand),
    Leave(oneshot::Sender<()>),
}

fn parse_kind(kind: &str) -> Result<TrackKind, JsValue> {
    match kind {
        "audio" => Ok(TrackKind::Audio),
        "video" => Ok(TrackKind::Video),
        other => Err(JsValue::from_str(&format!("unknown track kind {other}"))),
    }
}

async fn display_track() -> Result<MediaStreamTrack, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let devices = window.navigator().media_devices()?;
    let stream: MediaStream = JsFuture::from(devices.get_display_media()?)
        .await?
        .dyn_into()?;
    stream
        .get_video_tracks()
        .get(0)
        .dyn_into::<MediaStreamTrack>()
        .map_err(|_| JsValue::from_str("display capture has no video track"))
}

#[wasm_bindgen]
pub struct HuddleCall {
    identity: IssuedIdentity,
    room: RoomId,
    commands: mpsc::UnboundedSender<CallCommand>,
    sink: EventSink,
    tracks: LocalTracks,
}

#[wasm_bindgen]
impl HuddleCall {
    /// Joins `room` on `server` and starts connecting to everybody present.
    /// `local_stream` may be omitted; remote media is still received.
    pub async fn join(
        server: String,
        room: String,
        display_name: Option<String>,
        local_stream: Option<MediaStream>,
    ) -> Result<HuddleCall, JsValue> {
        let room = RoomId::parse(room).map_err(to_js)?;
        let transport = Arc::new(FetchTransport::new(&server)?);
        let joined = transport
            .join(&room, display_name.as_deref())
            .await
            .map_err(to_js)?;
        Logger::info(&format!(
            "Joined room {} as {} ({})",
            room, joined.participant.id, joined.participant.display_name
        ));

        let tracks = LocalTracks::default();
        let media = tracks.media_from_stream(local_stream.as_ref());
        let sink = EventSink::default();
        let connector = BrowserConnector::new(joined.ice_servers, tracks.clone(), sink.clone());

        let credentials = Credentials {
            room_id: room.clone(),
            participant_id: joined.participant.id.clone(),
            secret: joined.participant.secret.clone(),
        };
        let (mut engine, links) = NegotiationEngine::new(credentials, transport, connector, media);
        let events = engine.subscribe();
        for other in &joined.others {
            engine.observe_peer(&other.id).await;
        }

        let (commands, command_rx) = mpsc::unbounded();
        let call_loop = CallLoop::new(
            engine,
            links,
            events,
            command_rx,
            sink.clone(),
            tracks.clone(),
        );
        spawn_local(call_loop.run());

        Ok(HuddleCall {
            identity: joined.participant,
            room,
            commands,
            sink,
            tracks,
        })
    }

    #[wasm_bindgen(getter, js_name = participantId)]
    pub fn participant_id(&self) -> String {
        self.identity.id.to_string()
    }

    #[wasm_bindgen(getter, js_name = displayName)]
    pub fn display_name(&self) -> String {
        self.identity.display_name.clone()
    }

    #[wasm_bindgen(getter, js_name = isGuest)]
    pub fn is_guest(&self) -> bool {
        self.identity.is_guest
    }

    #[wasm_bindgen(getter)]
    pub fn room(&self) -> String {
        self.room.to_string()
    }

    /// Registers the callback for `added`, `connected`, `removed`, `track`
    /// and `ended` events. Events raised before registration are replayed.
    #[wasm_bindgen(js_name = onPeerEvent)]
    pub fn on_peer_event(&self, callback: js_sys::Function) {
        self.sink.set_callback(callback);
    }

    /// `kind` is `"audio"` or `"video"`. Never renegotiates.
    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, kind: &str, muted: bool) -> Result<(), JsValue> {
        let kind = parse_kind(kind)?;
        self.send(MediaCommand::SetMuted(kind, muted))
    }

    /// Adds or swaps the microphone and camera, e.g. once a device
    /// permission was granted after joining.
    #[wasm_bindgen(js_name = attachStream)]
    pub fn attach_stream(&self, stream: &MediaStream) -> Result<(), JsValue> {
        let media = self.tracks.media_from_stream(Some(stream));
        for track in [media.audio, media.camera].into_iter().flatten() {
            self.send(MediaCommand::AttachTrack(track))?;
        }
        Ok(())
    }

    /// Asks for a display capture and sends it instead of the camera. The
    /// browser's own "stop sharing" control ends the share as well.
    #[wasm_bindgen(js_name = startScreenShare)]
    pub fn start_screen_share(&self) -> js_sys::Promise {
        let commands = self.commands.clone();
        let tracks = self.tracks.clone();

        future_to_promise(async move {
            let track = display_track().await?;
            let Some(local) = tracks.insert(track.clone()) else {
                return Err(JsValue::from_str("display capture is not a video track"));
            };

            let id = local.id().to_string();
            let ended_tx = commands.clone();
            let ended_id = id.clone();
            let onended = Closure::wrap(Box::new(move || {
                let command = MediaCommand::StopScreenShare(Some(ended_id.clone()));
                let _ = ended_tx.unbounded_send(CallCommand::Media(command));
            }) as Box<dyn FnMut()>);
            track.set_onended(Some(onended.as_ref().unchecked_ref()));
            onended.forget();

            commands
                .unbounded_send(CallCommand::Media(MediaCommand::StartScreenShare(local)))
                .map_err(|_| {
                    tracks.stop(&id);
                    JsValue::from_str("call has ended")
                })?;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = stopScreenShare)]
    pub fn stop_screen_share(&self) -> Result<(), JsValue> {
        self.send(MediaCommand::StopScreenShare(None))
    }

    /// Closes every connection, stops local capture and posts `leave`.
    /// Resolves immediately if the call already ended.
    pub fn leave(&self) -> js_sys::Promise {
        let (done_tx, done_rx) = oneshot::channel();
        let sent = self.commands.unbounded_send(CallCommand::Leave(done_tx));

        future_to_promise(async move {
            if sent.is_ok() {
                let _ = done_rx.await;
            }
            Ok(JsValue::UNDEFINED)
        })
    }

    fn send(&self, command: MediaCommand) -> Result<(), JsValue> {
        self.commands
            .unbounded_send(CallCommand::Media(command))
            .map_err(|_| JsValue::from_str("call has ended"))
    }
}
