use std::collections::HashSet;
use tracing::{debug, warn};

use crate::election;
use crate::engine::{
    LinkState, NegotiationEngine, PeerConnector, PeerLink, RemovalReason, SignalTransport,
    SignalingState,
};
use crate::model::{Participant, ParticipantId, SignalKind};

impl<T, C> NegotiationEngine<T, C>
where
    T: SignalTransport,
    C: PeerConnector,
{
    /// Reconciles the peer set with a presence snapshot.
    ///
    /// Every present remote gets a connection, and this client offers to each
    /// remote it is elected offerer for. Remotes missing from the snapshot are
    /// dropped unless their connection is already up.
    pub async fn sync_participants(&mut self, participants: &[Participant]) {
        let present: HashSet<&ParticipantId> = participants.iter().map(|p| &p.id).collect();

        let absent: Vec<ParticipantId> = self
            .peers
            .iter()
            .filter(|(id, peer)| !present.contains(id) && peer.link_state != LinkState::Connected)
            .map(|(id, _)| id.clone())
            .collect();
        for remote in absent {
            debug!("Peer {} no longer present", remote);
            self.remove_peer(&remote, RemovalReason::Absent).await;
        }

        for participant in participants {
            if &participant.id == self.local_id() {
                continue;
            }
            self.observe_peer(&participant.id).await;
        }
    }

    /// Makes sure a connection to `remote` exists and, when this side is the
    /// offerer and the pair has not negotiated yet, starts negotiating.
    pub async fn observe_peer(&mut self, remote: &ParticipantId) {
        if remote == self.local_id() {
            return;
        }
        if self.ensure_peer(remote).await.is_err() {
            return;
        }
        if !election::is_offerer(self.local_id(), remote) {
            return;
        }

        let Some(peer) = self.peers.get(remote) else {
            return;
        };

        if let Some(offer) = peer.unsent_offer.clone() {
            if peer.link.signaling_state() == SignalingState::HaveLocalOffer {
                match self.send_signal(Some(remote), SignalKind::Offer, &offer).await {
                    Ok(_) => {
                        if let Some(peer) = self.peers.get_mut(remote) {
                            peer.unsent_offer = None;
                        }
                    }
                    Err(e) => warn!("Re-posting offer to {} failed: {}", remote, e),
                }
                return;
            }
        }

        let needs_offer = peer.renegotiation_pending || !peer.link.has_remote_description().await;
        if needs_offer {
            if let Err(e) = self.maybe_offer(remote).await {
                warn!("Offer to {} failed: {}", remote, e);
            }
        }
    }
}
