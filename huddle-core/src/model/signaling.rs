use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ParticipantId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Offer,
    Answer,
    Ice,
    Leave,
}

impl SignalKind {
    /// Only `leave` may be posted without a recipient.
    pub fn allows_broadcast(self) -> bool {
        matches!(self, SignalKind::Leave)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Ice => "ice",
            SignalKind::Leave => "leave",
        }
    }
}

/// One entry of a room's mailbox. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub seq: u64,
    pub kind: SignalKind,
    pub payload: Value,
    pub from_participant_id: ParticipantId,
    pub to_participant_id: Option<ParticipantId>,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    pub fn is_broadcast(&self) -> bool {
        self.to_participant_id.is_none()
    }

    pub fn is_addressed_to(&self, participant: &ParticipantId) -> bool {
        match &self.to_participant_id {
            Some(to) => to == participant,
            None => true,
        }
    }

    pub fn payload_as<P: DeserializeOwned>(&self) -> Result<P, serde_json::Error> {
        P::deserialize(&self.payload)
    }
}

/// A signal as a client hands it to the mailbox, before a seq is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingSignal {
    pub to: Option<ParticipantId>,
    pub kind: SignalKind,
    pub payload: Value,
}

impl OutgoingSignal {
    pub fn new<P: Serialize>(
        to: Option<ParticipantId>,
        kind: SignalKind,
        payload: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            to,
            kind,
            payload: serde_json::to_value(payload)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// Payload of `offer` and `answer` signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Payload of `ice` signals, shaped like the browser's `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

/// Payload of `leave` signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub participant_id: ParticipantId,
}
