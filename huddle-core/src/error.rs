use thiserror::Error;

use crate::model::ParticipantId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid room id: {0}")]
    InvalidRoomId(String),
}

/// Failures talking to the signaling server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server no longer accepts this participant id + secret.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server understood the request and refused it.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the next scheduled poll may simply try again.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Decode(_) => true,
            TransportError::Rejected { status, .. } => *status >= 500,
            TransportError::Unauthorized(_) => false,
        }
    }
}

/// Failures reported by a peer connection implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Operation not allowed in signaling state {0}")]
    InvalidState(String),

    #[error("Session description rejected: {0}")]
    Sdp(String),

    #[error("ICE candidate rejected: {0}")]
    Ice(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Peer connection error: {0}")]
    Connection(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid signal payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("No peer connection for {0}")]
    UnknownPeer(ParticipantId),
}
