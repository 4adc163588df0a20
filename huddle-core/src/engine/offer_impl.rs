use tracing::{debug, info, warn};

use crate::engine::{NegotiationEngine, PeerConnector, PeerLink, SignalTransport, SignalingState};
use crate::error::EngineError;
use crate::model::{ParticipantId, SignalKind};

impl<T, C> NegotiationEngine<T, C>
where
    T: SignalTransport,
    C: PeerConnector,
{
    /// Creates and posts an offer to `remote` if the connection is idle.
    ///
    /// Returns `Ok(false)` when the attempt was skipped because an offer is
    /// already being made or the pair is mid-negotiation. A post failure keeps
    /// the offer around so the next presence tick can re-send it.
    pub(crate) async fn maybe_offer(&mut self, remote: &ParticipantId) -> Result<bool, EngineError> {
        let Some(peer) = self.peers.get_mut(remote) else {
            return Err(EngineError::UnknownPeer(remote.clone()));
        };

        if peer.is_making_offer || peer.link.signaling_state() != SignalingState::Stable {
            debug!(
                "Skipping offer to {}: making_offer={}, state={:?}",
                remote,
                peer.is_making_offer,
                peer.link.signaling_state()
            );
            return Ok(false);
        }

        peer.is_making_offer = true;
        let created = peer.link.create_offer().await;
        peer.is_making_offer = false;
        let offer = created?;
        peer.renegotiation_pending = false;
        peer.unsent_offer = None;

        match self.send_signal(Some(remote), SignalKind::Offer, &offer).await {
            Ok(_) => {
                info!("Sent offer to {}", remote);
                Ok(true)
            }
            Err(e) => {
                warn!("Posting offer to {} failed, keeping it for retry: {}", remote, e);
                if let Some(peer) = self.peers.get_mut(remote) {
                    peer.unsent_offer = Some(offer);
                }
                Err(e)
            }
        }
    }
}
