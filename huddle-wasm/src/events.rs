//! Peer events as plain JS objects for the page's `onPeerEvent` callback.

use huddle_core::model::ParticipantId;
use huddle_core::{PeerEvent, RemovalReason};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::MediaStreamTrack;

use crate::logger::Logger;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

fn reason_name(reason: RemovalReason) -> &'static str {
    match reason {
        RemovalReason::Left => "left",
        RemovalReason::ConnectionLost(_) => "connectionLost",
        RemovalReason::Absent => "absent",
        RemovalReason::LocalShutdown => "localShutdown",
    }
}

#[derive(Default)]
struct SinkState {
    callback: Option<js_sys::Function>,
    pending: Vec<JsValue>,
}

/// Delivers events to the registered callback. Events raised before one is
/// registered are held and flushed on registration.
#[derive(Clone, Default)]
pub struct EventSink {
    state: Rc<RefCell<SinkState>>,
}

impl EventSink {
    pub fn set_callback(&self, callback: js_sys::Function) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.callback = Some(callback.clone());
            std::mem::take(&mut state.pending)
        };
        for event in pending {
            call(&callback, &event);
        }
    }

    pub fn emit(&self, event: JsValue) {
        // Cloned out so the callback may re-register without a borrow conflict.
        let callback = self.state.borrow().callback.clone();
        match callback {
            Some(callback) => call(&callback, &event),
            None => self.state.borrow_mut().pending.push(event),
        }
    }

    pub fn peer_event(&self, event: &PeerEvent) {
        let view = match event {
            PeerEvent::Added(id) => EventView {
                kind: "added",
                peer_id: Some(id.as_str()),
                reason: None,
            },
            PeerEvent::Connected(id) => EventView {
                kind: "connected",
                peer_id: Some(id.as_str()),
                reason: None,
            },
            PeerEvent::Removed(id, reason) => EventView {
                kind: "removed",
                peer_id: Some(id.as_str()),
                reason: Some(reason_name(*reason)),
            },
        };
        self.emit_view(&view);
    }

    /// `{type: "track", peerId, track, streams}`; the page attaches `track`
    /// to a media element.
    pub fn track(&self, peer: &ParticipantId, track: MediaStreamTrack, streams: js_sys::Array) {
        let event = js_sys::Object::new();
        let fields: [(&str, JsValue); 4] = [
            ("type", "track".into()),
            ("peerId", peer.as_str().into()),
            ("track", track.into()),
            ("streams", streams.into()),
        ];
        for (key, value) in fields {
            let _ = js_sys::Reflect::set(&event, &key.into(), &value);
        }
        self.emit(event.into());
    }

    /// The call is over without the page asking, e.g. revoked credentials.
    pub fn ended(&self, reason: &str) {
        self.emit_view(&EventView {
            kind: "ended",
            peer_id: None,
            reason: Some(reason),
        });
    }

    fn emit_view(&self, view: &EventView<'_>) {
        match serde_wasm_bindgen::to_value(view) {
            Ok(value) => self.emit(value),
            Err(e) => Logger::warn(&format!("Failed to convert {} event: {}", view.kind, e)),
        }
    }
}

fn call(callback: &js_sys::Function, event: &JsValue) {
    if let Err(e) = callback.call1(&JsValue::NULL, event) {
        Logger::error("Peer event callback threw", &e);
    }
}
