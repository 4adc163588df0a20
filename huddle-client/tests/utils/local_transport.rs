use async_trait::async_trait;
use huddle_core::engine::SignalTransport;
use huddle_core::error::TransportError;
use huddle_core::model::wire::{FetchQuery, FetchResponse, JoinResponse, PostSignalRequest};
use huddle_core::model::{Credentials, OutgoingSignal, Participant, RoomId};
use huddle_core::utils::default_ice_servers;
use huddle_server::{RoomManager, RoomSettings, SignalingError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Talks to an in-process [`RoomManager`] instead of going over HTTP.
pub struct LocalTransport {
    rooms: RoomManager,
    offline: AtomicBool,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::with_rooms(RoomManager::new(RoomSettings::default()))
    }

    pub fn with_rooms(rooms: RoomManager) -> Self {
        Self {
            rooms,
            offline: AtomicBool::new(false),
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Every call except join fails with a network error while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

fn to_transport(e: SignalingError) -> TransportError {
    match e {
        SignalingError::Unauthorized(message) => TransportError::Unauthorized(message),
        other => TransportError::Rejected {
            status: other.status_code().as_u16(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl SignalTransport for LocalTransport {
    async fn join(
        &self,
        room: &RoomId,
        display_name: Option<&str>,
    ) -> Result<JoinResponse, TransportError> {
        let (participant, others) = self.rooms.join(room, display_name);
        Ok(JoinResponse {
            participant,
            others,
            ice_servers: default_ice_servers(),
        })
    }

    async fn participants(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Participant>, TransportError> {
        self.check()?;
        self.rooms
            .participants(
                &credentials.room_id,
                &credentials.participant_id,
                &credentials.secret,
            )
            .map_err(to_transport)
    }

    async fn fetch(
        &self,
        credentials: &Credentials,
        after_seq: u64,
        limit: u32,
    ) -> Result<FetchResponse, TransportError> {
        self.check()?;
        let query = FetchQuery {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
            after_seq,
            limit: Some(limit),
        };
        self.rooms
            .fetch(&credentials.room_id, &query)
            .map_err(to_transport)
    }

    async fn post(
        &self,
        credentials: &Credentials,
        signal: &OutgoingSignal,
    ) -> Result<u64, TransportError> {
        self.check()?;
        let request = PostSignalRequest {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
            to_participant_id: signal.to.clone(),
            kind: signal.kind,
            payload: signal.payload.clone(),
        };
        self.rooms
            .post(&credentials.room_id, request)
            .map_err(to_transport)
    }

    async fn leave(&self, credentials: &Credentials) -> Result<(), TransportError> {
        self.check()?;
        self.rooms
            .leave(
                &credentials.room_id,
                &credentials.participant_id,
                &credentials.secret,
            )
            .map_err(to_transport)
    }
}
