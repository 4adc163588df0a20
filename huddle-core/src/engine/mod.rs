//! Per-client negotiation engine.
//!
//! Owns one connection per remote participant, keyed by participant id. Each
//! peer entry carries its own ICE queue and offer flags; there is no lock shared
//! between peers. The engine never sleeps or spawns: a poller feeds it presence
//! snapshots, mailbox signals and [`LinkEvent`]s, one call at a time.

use futures::channel::mpsc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::EngineError;
use crate::media::LocalMedia;
use crate::model::{Credentials, OutgoingSignal, ParticipantId, SignalKind};

mod handle_signal_impl;
mod link;
mod link_event_impl;
mod media_impl;
mod offer_impl;
mod peer_state;
mod presence_impl;
mod transport;

pub use link::{
    LinkEvent, LinkEventSender, LinkEvents, LinkState, PeerConnector, PeerLink, SignalingState,
    TrackSwap,
};
pub use peer_state::PeerState;
pub use transport::SignalTransport;

/// `Send + Sync` on native targets, nothing on wasm where everything lives on
/// the browser's single thread.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

/// Why a peer left the UI-facing peer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The remote posted `leave`.
    Left,
    /// The connection went failed, disconnected or closed.
    ConnectionLost(LinkState),
    /// The remote dropped out of the presence list before connecting.
    Absent,
    /// This client is leaving.
    LocalShutdown,
}

/// Notifications for whatever renders the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Added(ParticipantId),
    Connected(ParticipantId),
    Removed(ParticipantId, RemovalReason),
}

pub struct NegotiationEngine<T, C: PeerConnector> {
    credentials: Credentials,
    transport: Arc<T>,
    connector: C,
    peers: HashMap<ParticipantId, PeerState<C::Link>>,
    media: LocalMedia,
    link_tx: LinkEventSender,
    subscribers: Vec<mpsc::UnboundedSender<PeerEvent>>,
}

impl<T, C> NegotiationEngine<T, C>
where
    T: SignalTransport,
    C: PeerConnector,
{
    /// The returned receiver carries events from every link this engine
    /// creates; the caller must drain it into [`Self::handle_link_event`].
    pub fn new(
        credentials: Credentials,
        transport: Arc<T>,
        connector: C,
        media: LocalMedia,
    ) -> (Self, LinkEvents) {
        let (link_tx, link_rx) = mpsc::unbounded();
        let engine = Self {
            credentials,
            transport,
            connector,
            peers: HashMap::new(),
            media,
            link_tx,
            subscribers: Vec::new(),
        };
        (engine, link_rx)
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.credentials.participant_id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PeerEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Remote ids with a live connection object, sorted.
    pub fn peer_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_peer(&self, remote: &ParticipantId) -> bool {
        self.peers.contains_key(remote)
    }

    pub fn peer(&self, remote: &ParticipantId) -> Option<&PeerState<C::Link>> {
        self.peers.get(remote)
    }

    fn emit(&mut self, event: PeerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(event.clone()).is_ok());
    }

    /// Creates the connection for `remote` unless it already exists.
    /// Returns whether a new connection was made.
    async fn ensure_peer(&mut self, remote: &ParticipantId) -> Result<bool, EngineError> {
        if self.peers.contains_key(remote) {
            return Ok(false);
        }

        debug!("Creating peer connection for {}", remote);
        let link = match self
            .connector
            .connect(remote, &self.media, self.link_tx.clone())
            .await
        {
            Ok(link) => link,
            Err(e) => {
                error!("Failed to create peer connection for {}: {}", remote, e);
                return Err(e.into());
            }
        };

        self.peers
            .insert(remote.clone(), PeerState::new(remote.clone(), link));
        info!("Peer {} added", remote);
        self.emit(PeerEvent::Added(remote.clone()));
        Ok(true)
    }

    async fn send_signal<P: Serialize + Sync>(
        &self,
        to: Option<&ParticipantId>,
        kind: SignalKind,
        payload: &P,
    ) -> Result<u64, EngineError> {
        let signal = OutgoingSignal::new(to.cloned(), kind, payload)?;
        let seq = self.transport.post(&self.credentials, &signal).await?;
        debug!("Posted {} to {:?} at seq {}", kind.as_str(), to, seq);
        Ok(seq)
    }
}
