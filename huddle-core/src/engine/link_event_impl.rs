use tracing::{debug, info, warn};

use crate::engine::{
    LinkEvent, LinkState, NegotiationEngine, PeerConnector, PeerEvent, PeerLink, RemovalReason,
    SignalTransport,
};
use crate::model::{ParticipantId, SignalKind};

impl<T, C> NegotiationEngine<T, C>
where
    T: SignalTransport,
    C: PeerConnector,
{
    pub async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::CandidateGenerated(remote, candidate) => {
                if !self.peers.contains_key(&remote) {
                    debug!("Dropping local candidate for removed peer {}", remote);
                    return;
                }
                if let Err(e) = self
                    .send_signal(Some(&remote), SignalKind::Ice, &candidate)
                    .await
                {
                    warn!("Failed to post ICE candidate to {}: {}", remote, e);
                }
            }
            LinkEvent::StateChanged(remote, state) => {
                let Some(peer) = self.peers.get_mut(&remote) else {
                    return;
                };
                if peer.link_state == state {
                    return;
                }
                debug!("Peer {} state {:?} -> {:?}", remote, peer.link_state, state);
                peer.link_state = state;

                if state == LinkState::Connected {
                    info!("Peer {} connected", remote);
                    self.emit(PeerEvent::Connected(remote));
                } else if state.is_terminal() {
                    self.remove_peer(&remote, RemovalReason::ConnectionLost(state))
                        .await;
                }
            }
        }
    }

    /// Closes and forgets the connection to `remote`. Returns `false` if there
    /// was nothing to remove.
    pub async fn remove_peer(&mut self, remote: &ParticipantId, reason: RemovalReason) -> bool {
        let Some(peer) = self.peers.remove(remote) else {
            return false;
        };

        if let Err(e) = peer.link.close().await {
            warn!("Error closing connection to {}: {}", remote, e);
        }
        info!("Peer {} removed ({:?})", remote, reason);
        self.emit(PeerEvent::Removed(remote.clone(), reason));
        true
    }

    /// Tears down every connection and stops local tracks.
    pub async fn close_all(&mut self) {
        for remote in self.peer_ids() {
            self.remove_peer(&remote, RemovalReason::LocalShutdown).await;
        }
        self.media.stop_all();
    }
}
