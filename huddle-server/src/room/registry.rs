use chrono::Utc;
use huddle_core::model::{IssuedIdentity, Participant, ParticipantId, Secret};
use ring::constant_time;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::SignalingError;

pub const MAX_DISPLAY_NAME_CHARS: usize = 48;

struct ParticipantRecord {
    public: Participant,
    secret: Secret,
    /// Join order within the room.
    ordinal: u64,
    last_seen: Instant,
    left: bool,
}

impl ParticipantRecord {
    fn secret_matches(&self, presented: &Secret) -> bool {
        constant_time::verify_slices_are_equal(
            self.secret.as_str().as_bytes(),
            presented.as_str().as_bytes(),
        )
        .is_ok()
    }

    fn is_present(&self, now: Instant, liveness: Duration) -> bool {
        !self.left && now.saturating_duration_since(self.last_seen) <= liveness
    }
}

/// Outcome of an authenticated leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    AlreadyLeft,
}

/// Participants of one room. Records are kept after leave so that a repeated
/// leave can be recognised.
#[derive(Default)]
pub struct Registry {
    records: HashMap<ParticipantId, ParticipantRecord>,
    next_ordinal: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh identity. Never fails.
    pub fn join(&mut self, display_name: Option<&str>, now: Instant) -> IssuedIdentity {
        let id = ParticipantId::generate();
        let secret = Secret::generate();
        let (display_name, is_guest) = match display_name.and_then(sanitize_display_name) {
            Some(name) => (name, false),
            None => (guest_label(&id), true),
        };

        let public = Participant {
            id: id.clone(),
            display_name: display_name.clone(),
            is_guest,
            created_at: Utc::now(),
        };
        self.records.insert(
            id.clone(),
            ParticipantRecord {
                public,
                secret: secret.clone(),
                ordinal: self.next_ordinal,
                last_seen: now,
                left: false,
            },
        );
        self.next_ordinal += 1;

        IssuedIdentity {
            id,
            secret,
            display_name,
            is_guest,
        }
    }

    /// Checks id + secret of a participant that has not left and refreshes
    /// its heartbeat.
    pub fn authenticate(
        &mut self,
        id: &ParticipantId,
        secret: &Secret,
        now: Instant,
    ) -> Result<(), SignalingError> {
        match self.records.get_mut(id) {
            Some(record) if !record.left && record.secret_matches(secret) => {
                record.last_seen = now;
                Ok(())
            }
            _ => Err(SignalingError::Unauthorized(
                "unknown participant or wrong secret".to_string(),
            )),
        }
    }

    /// Marks the participant as gone. Repeating a leave with valid credentials
    /// is not an error.
    pub fn leave(
        &mut self,
        id: &ParticipantId,
        secret: &Secret,
    ) -> Result<LeaveOutcome, SignalingError> {
        match self.records.get_mut(id) {
            Some(record) if record.secret_matches(secret) => {
                if record.left {
                    return Ok(LeaveOutcome::AlreadyLeft);
                }
                record.left = true;
                Ok(LeaveOutcome::Left)
            }
            _ => Err(SignalingError::Unauthorized(
                "unknown participant or wrong secret".to_string(),
            )),
        }
    }

    /// Whether `id` ever joined this room, present or not.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.records.contains_key(id)
    }

    /// Present participants in join order.
    pub fn present(&self, now: Instant, liveness: Duration) -> Vec<Participant> {
        let mut present: Vec<&ParticipantRecord> = self
            .records
            .values()
            .filter(|r| r.is_present(now, liveness))
            .collect();
        present.sort_by_key(|r| r.ordinal);
        present.into_iter().map(|r| r.public.clone()).collect()
    }

    pub fn has_present(&self, now: Instant, liveness: Duration) -> bool {
        self.records.values().any(|r| r.is_present(now, liveness))
    }
}

/// Strips control characters, collapses whitespace and caps the length.
/// Returns `None` when nothing printable is left.
pub fn sanitize_display_name(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control() || c.is_whitespace()).collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_DISPLAY_NAME_CHARS).collect();
    let capped = capped.trim_end().to_string();
    if capped.is_empty() { None } else { Some(capped) }
}

fn guest_label(id: &ParticipantId) -> String {
    let tag: String = id
        .as_str()
        .chars()
        .filter(char::is_ascii_hexdigit)
        .take(4)
        .collect::<String>()
        .to_uppercase();
    format!("Guest {}", tag)
}
