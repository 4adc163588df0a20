use huddle_core::error::{EngineError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid server url: {0}")]
    InvalidServerUrl(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("WebRTC error: {0}")]
    WebRtc(String),

    #[error("Poller task failed: {0}")]
    Task(String),
}

impl ClientError {
    /// The server revoked this participant; joining again is the only way back.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(TransportError::Unauthorized(_))
                | ClientError::Engine(EngineError::Transport(TransportError::Unauthorized(_)))
        )
    }
}

impl From<webrtc::Error> for ClientError {
    fn from(e: webrtc::Error) -> Self {
        ClientError::WebRtc(e.to_string())
    }
}
