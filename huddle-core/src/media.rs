//! Description of the tracks this client sends.
//!
//! Platform layers own the real track objects and look them up by id; this
//! module only tracks which tracks exist and whether they are enabled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone)]
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    enabled: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Clones share the flag, so a sample pump holding a clone sees the change.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalMedia {
    pub audio: Option<LocalTrack>,
    pub camera: Option<LocalTrack>,
    pub screen: Option<LocalTrack>,
}

impl LocalMedia {
    pub fn none() -> Self {
        Self::default()
    }

    /// Screen share wins over the camera while it is active.
    pub fn outgoing_video(&self) -> Option<&LocalTrack> {
        self.screen.as_ref().or(self.camera.as_ref())
    }

    pub fn outgoing(&self, kind: TrackKind) -> Option<&LocalTrack> {
        match kind {
            TrackKind::Audio => self.audio.as_ref(),
            TrackKind::Video => self.outgoing_video(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.camera.is_none() && self.screen.is_none()
    }

    /// Returns false when there is no track of that kind to mute.
    pub fn set_muted(&self, kind: TrackKind, muted: bool) -> bool {
        let track = match kind {
            TrackKind::Audio => self.audio.as_ref(),
            TrackKind::Video => self.camera.as_ref(),
        };
        match track {
            Some(track) => {
                track.set_enabled(!muted);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for track in [self.audio.take(), self.camera.take(), self.screen.take()]
            .into_iter()
            .flatten()
        {
            track.set_enabled(false);
        }
    }
}
