use huddle_core::media::{LocalMedia, LocalTrack, TrackKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{MediaStream, MediaStreamTrack};

fn track_kind(track: &MediaStreamTrack) -> Option<TrackKind> {
    match track.kind().as_str() {
        "audio" => Some(TrackKind::Audio),
        "video" => Some(TrackKind::Video),
        _ => None,
    }
}

fn first_track(tracks: js_sys::Array) -> Option<MediaStreamTrack> {
    tracks.get(0).dyn_into::<MediaStreamTrack>().ok()
}

/// The page's capture tracks, keyed by the id the engine knows them by.
#[derive(Clone, Default)]
pub struct LocalTracks {
    tracks: Rc<RefCell<HashMap<String, MediaStreamTrack>>>,
}

impl LocalTracks {
    pub fn insert(&self, track: MediaStreamTrack) -> Option<LocalTrack> {
        let kind = track_kind(&track)?;
        let local = LocalTrack::new(track.id(), kind);
        self.tracks.borrow_mut().insert(track.id(), track);
        Some(local)
    }

    /// First audio track as the microphone, first video track as the camera.
    pub fn media_from_stream(&self, stream: Option<&MediaStream>) -> LocalMedia {
        let Some(stream) = stream else {
            return LocalMedia::none();
        };
        LocalMedia {
            audio: first_track(stream.get_audio_tracks()).and_then(|t| self.insert(t)),
            camera: first_track(stream.get_video_tracks()).and_then(|t| self.insert(t)),
            screen: None,
        }
    }

    pub fn get(&self, id: &str) -> Option<MediaStreamTrack> {
        self.tracks.borrow().get(id).cloned()
    }

    /// Mirrors the engine's enabled flag onto the capture track.
    pub fn sync_enabled(&self, track: &LocalTrack) {
        if let Some(media_track) = self.get(track.id()) {
            media_track.set_enabled(track.is_enabled());
        }
    }

    /// Stops capture and forgets the track.
    pub fn stop(&self, id: &str) {
        if let Some(track) = self.tracks.borrow_mut().remove(id) {
            track.stop();
        }
    }

    pub fn stop_all(&self) {
        for (_, track) in self.tracks.borrow_mut().drain() {
            track.stop();
        }
    }
}
