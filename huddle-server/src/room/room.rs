use huddle_core::model::wire::{FetchResponse, PostSignalRequest};
use huddle_core::model::{
    IssuedIdentity, LeavePayload, Participant, ParticipantId, RoomId, Secret, SignalKind,
};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::SignalingError;
use crate::room::{LeaveOutcome, Mailbox, Registry, RoomSettings};

/// Registry and mailbox of one room. All access goes through the room's
/// entry in [`crate::room::RoomManager`], which serializes writers.
pub struct Room {
    id: RoomId,
    registry: Registry,
    mailbox: Mailbox,
    last_activity: Instant,
}

impl Room {
    pub fn new(id: RoomId, now: Instant) -> Self {
        Self {
            id,
            registry: Registry::new(),
            mailbox: Mailbox::new(),
            last_activity: now,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn last_seq(&self) -> u64 {
        self.mailbox.last_seq()
    }

    /// Registers a participant and returns the others currently present.
    pub fn join(
        &mut self,
        display_name: Option<&str>,
        settings: &RoomSettings,
        now: Instant,
    ) -> (IssuedIdentity, Vec<Participant>) {
        self.last_activity = now;
        let identity = self.registry.join(display_name, now);
        let others = self
            .registry
            .present(now, settings.liveness)
            .into_iter()
            .filter(|p| p.id != identity.id)
            .collect();
        info!(
            "Participant {} ({}) joined room {}",
            identity.id, identity.display_name, self.id
        );
        (identity, others)
    }

    pub fn participants(
        &mut self,
        id: &ParticipantId,
        secret: &Secret,
        settings: &RoomSettings,
        now: Instant,
    ) -> Result<Vec<Participant>, SignalingError> {
        self.registry.authenticate(id, secret, now)?;
        self.last_activity = now;
        Ok(self.registry.present(now, settings.liveness))
    }

    /// Validates and appends one signal. Seq assignment and append happen in
    /// this single call.
    pub fn post(
        &mut self,
        request: PostSignalRequest,
        settings: &RoomSettings,
        now: Instant,
    ) -> Result<u64, SignalingError> {
        self.registry
            .authenticate(&request.participant_id, &request.secret, now)?;

        match (&request.to_participant_id, request.kind.allows_broadcast()) {
            (None, false) => {
                return Err(SignalingError::BadRequest(format!(
                    "{} signals need a toParticipantId",
                    request.kind.as_str()
                )));
            }
            (Some(to), _) if to == &request.participant_id => {
                return Err(SignalingError::BadRequest(
                    "cannot signal yourself".to_string(),
                ));
            }
            (Some(to), _) if !self.registry.contains(to) => {
                return Err(SignalingError::BadRequest(format!(
                    "{} is not a participant of this room",
                    to
                )));
            }
            _ => {}
        }

        let size = serde_json::to_vec(&request.payload)
            .map_err(|e| SignalingError::Internal(e.to_string()))?
            .len();
        if size > settings.max_payload_bytes {
            return Err(SignalingError::PayloadTooLarge {
                size,
                limit: settings.max_payload_bytes,
            });
        }

        self.last_activity = now;
        let seq = self.mailbox.append(
            request.participant_id.clone(),
            request.to_participant_id.clone(),
            request.kind,
            request.payload,
        );
        debug!(
            "Room {}: {} from {} to {:?} at seq {}",
            self.id,
            request.kind.as_str(),
            request.participant_id,
            request.to_participant_id,
            seq
        );
        Ok(seq)
    }

    pub fn fetch(
        &mut self,
        id: &ParticipantId,
        secret: &Secret,
        after_seq: u64,
        limit: Option<u32>,
        settings: &RoomSettings,
        now: Instant,
    ) -> Result<FetchResponse, SignalingError> {
        self.registry.authenticate(id, secret, now)?;
        self.last_activity = now;
        let limit = settings.clamp_limit(limit);
        Ok(self.mailbox.fetch(id, after_seq, limit as usize))
    }

    /// Marks the participant as gone and broadcasts `leave` the first time.
    pub fn leave(
        &mut self,
        id: &ParticipantId,
        secret: &Secret,
        now: Instant,
    ) -> Result<(), SignalingError> {
        match self.registry.leave(id, secret)? {
            LeaveOutcome::AlreadyLeft => {
                debug!("Repeated leave from {} in room {}", id, self.id);
            }
            LeaveOutcome::Left => {
                self.last_activity = now;
                let payload = serde_json::to_value(LeavePayload {
                    participant_id: id.clone(),
                })
                .map_err(|e| SignalingError::Internal(e.to_string()))?;
                let seq = self.mailbox.append(id.clone(), None, SignalKind::Leave, payload);
                info!("Participant {} left room {} (seq {})", id, self.id, seq);
            }
        }
        Ok(())
    }

    /// Nobody present and no activity within `idle`.
    pub fn is_idle(&self, now: Instant, idle: Duration, liveness: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > idle
            && !self.registry.has_present(now, liveness)
    }
}
