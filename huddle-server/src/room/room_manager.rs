use dashmap::DashMap;
use huddle_core::model::wire::{FetchQuery, FetchResponse, PostSignalRequest};
use huddle_core::model::{IssuedIdentity, Participant, ParticipantId, RoomId, Secret};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{Config, DEFAULT_FETCH_LIMIT};
use crate::error::SignalingError;
use crate::room::Room;

/// Limits applied to every room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    pub liveness: Duration,
    pub max_fetch_limit: u32,
    pub max_payload_bytes: usize,
    pub room_idle: Duration,
}

impl RoomSettings {
    /// Missing limit means the default page size; anything else is clamped
    /// to `1..=max_fetch_limit`.
    pub fn clamp_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(DEFAULT_FETCH_LIMIT)
            .clamp(1, self.max_fetch_limit)
    }
}

impl From<&Config> for RoomSettings {
    fn from(config: &Config) -> Self {
        Self {
            liveness: config.liveness(),
            max_fetch_limit: config.max_fetch_limit,
            max_payload_bytes: config.max_payload_bytes,
            room_idle: config.room_idle(),
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// All rooms of this server, created on first join.
///
/// Each operation holds the room's map entry for its whole duration, which
/// makes seq assignment and append one atomic step per room.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    settings: RoomSettings,
}

impl RoomManager {
    pub fn new(settings: RoomSettings) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn join(
        &self,
        room_id: &RoomId,
        display_name: Option<&str>,
    ) -> (IssuedIdentity, Vec<Participant>) {
        let now = Instant::now();
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone(), now)
        });
        room.join(display_name, &self.settings, now)
    }

    pub fn participants(
        &self,
        room_id: &RoomId,
        id: &ParticipantId,
        secret: &Secret,
    ) -> Result<Vec<Participant>, SignalingError> {
        let mut room = self.room_mut(room_id)?;
        room.participants(id, secret, &self.settings, Instant::now())
    }

    pub fn post(&self, room_id: &RoomId, request: PostSignalRequest) -> Result<u64, SignalingError> {
        let mut room = self.room_mut(room_id)?;
        room.post(request, &self.settings, Instant::now())
    }

    pub fn fetch(
        &self,
        room_id: &RoomId,
        query: &FetchQuery,
    ) -> Result<FetchResponse, SignalingError> {
        let mut room = self.room_mut(room_id)?;
        room.fetch(
            &query.participant_id,
            &query.secret,
            query.after_seq,
            query.limit,
            &self.settings,
            Instant::now(),
        )
    }

    pub fn leave(
        &self,
        room_id: &RoomId,
        id: &ParticipantId,
        secret: &Secret,
    ) -> Result<(), SignalingError> {
        // A pruned room had nobody present, so whoever leaves it already left.
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            debug!("Leave for unknown room {} treated as done", room_id);
            return Ok(());
        };
        room.leave(id, secret, Instant::now())
    }

    /// Drops rooms nobody is in that have been quiet for the idle window.
    /// Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.rooms.len();
        self.rooms.retain(|id, room| {
            let idle = room.is_idle(now, self.settings.room_idle, self.settings.liveness);
            if idle {
                info!("Pruning idle room: {}", id);
            }
            !idle
        });
        before.saturating_sub(self.rooms.len())
    }

    /// Credentials of an unknown room can never match, so this is reported
    /// the same way as a bad secret.
    fn room_mut(
        &self,
        room_id: &RoomId,
    ) -> Result<dashmap::mapref::one::RefMut<'_, RoomId, Room>, SignalingError> {
        self.rooms.get_mut(room_id).ok_or_else(|| {
            SignalingError::Unauthorized("unknown participant or wrong secret".to_string())
        })
    }
}
