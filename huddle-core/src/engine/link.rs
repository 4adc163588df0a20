use async_trait::async_trait;
use futures::channel::mpsc;

use crate::engine::MaybeSend;
use crate::error::LinkError;
use crate::media::{LocalMedia, LocalTrack, TrackKind};
use crate::model::{IceCandidate, ParticipantId, SessionDescription};

pub type LinkEventSender = mpsc::UnboundedSender<LinkEvent>;
pub type LinkEvents = mpsc::UnboundedReceiver<LinkEvent>;

/// Negotiation state of a single connection, as WebRTC reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    Closed,
}

/// Transport state of a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl LinkState {
    /// States after which the connection object is released.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LinkState::Disconnected | LinkState::Failed | LinkState::Closed
        )
    }
}

/// Outcome of swapping an outgoing track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSwap {
    /// The existing sender now carries the new track; nothing to signal.
    Replaced,
    /// The link had no sender of that kind; a new offer is required.
    NeedsRenegotiation,
}

/// Events raised by a connection outside of any engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    CandidateGenerated(ParticipantId, IceCandidate),
    StateChanged(ParticipantId, LinkState),
}

/// One connection to one remote participant.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PeerLink: MaybeSend {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription, LinkError>;

    /// Creates an answer and installs it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription, LinkError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError>;

    fn signaling_state(&self) -> SignalingState;

    async fn has_remote_description(&self) -> bool;

    /// Puts `track` (or nothing) on the sender of the given kind.
    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Option<&LocalTrack>,
    ) -> Result<TrackSwap, LinkError>;

    async fn close(&self) -> Result<(), LinkError>;
}

/// Builds connections. Implementations attach the outgoing tracks in `media`
/// and give every missing kind a sendrecv transceiver with an idle sender, so
/// the connection receives that kind now and a track granted later only needs
/// [`PeerLink::replace_track`] on either side of the pair.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PeerConnector: MaybeSend {
    type Link: PeerLink;

    async fn connect(
        &self,
        remote: &ParticipantId,
        media: &LocalMedia,
        events: LinkEventSender,
    ) -> Result<Self::Link, LinkError>;
}
