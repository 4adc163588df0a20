use tracing::{debug, info, warn};

use crate::engine::{
    NegotiationEngine, PeerConnector, PeerLink, RemovalReason, SignalTransport, SignalingState,
};
use crate::error::EngineError;
use crate::model::{
    IceCandidate, LeavePayload, ParticipantId, SessionDescription, Signal, SignalKind,
};

impl<T, C> NegotiationEngine<T, C>
where
    T: SignalTransport,
    C: PeerConnector,
{
    /// Applies one mailbox signal. Signals must be fed in seq order.
    ///
    /// Errors are scoped to the one peer the signal came from; the caller logs
    /// them and keeps going.
    pub async fn handle_signal(&mut self, signal: &Signal) -> Result<(), EngineError> {
        let from = &signal.from_participant_id;
        if from == self.local_id() {
            return Ok(());
        }
        if let Some(to) = &signal.to_participant_id {
            if to != self.local_id() {
                debug!("Ignoring signal {} addressed to {}", signal.seq, to);
                return Ok(());
            }
        }

        debug!(
            "Handling {} from {} (seq {})",
            signal.kind.as_str(),
            from,
            signal.seq
        );

        match signal.kind {
            SignalKind::Offer => self.on_remote_offer(from, signal.payload_as()?).await,
            SignalKind::Answer => self.on_remote_answer(from, signal.payload_as()?).await,
            SignalKind::Ice => self.on_remote_ice(from, signal.payload_as()?).await,
            SignalKind::Leave => {
                if let Ok(payload) = signal.payload_as::<LeavePayload>() {
                    if &payload.participant_id != from {
                        warn!(
                            "Leave from {} names {}, tearing down the sender",
                            from, payload.participant_id
                        );
                    }
                }
                self.remove_peer(from, RemovalReason::Left).await;
                Ok(())
            }
        }
    }

    async fn on_remote_offer(
        &mut self,
        from: &ParticipantId,
        offer: SessionDescription,
    ) -> Result<(), EngineError> {
        self.ensure_peer(from).await?;
        let Some(peer) = self.peers.get_mut(from) else {
            return Err(EngineError::UnknownPeer(from.clone()));
        };

        // An unanswered local offer takes precedence over the remote's.
        let state = peer.link.signaling_state();
        if state != SignalingState::Stable {
            warn!("Ignoring offer from {} in state {:?}", from, state);
            return Ok(());
        }

        peer.link.set_remote_description(offer).await?;
        peer.flush_pending_ice().await;
        let answer = peer.link.create_answer().await?;

        self.send_signal(Some(from), SignalKind::Answer, &answer)
            .await?;
        info!("Answered offer from {}", from);
        Ok(())
    }

    async fn on_remote_answer(
        &mut self,
        from: &ParticipantId,
        answer: SessionDescription,
    ) -> Result<(), EngineError> {
        let Some(peer) = self.peers.get_mut(from) else {
            warn!("Answer from {} without a connection", from);
            return Ok(());
        };

        let state = peer.link.signaling_state();
        if state != SignalingState::HaveLocalOffer {
            warn!("Ignoring answer from {} in state {:?}", from, state);
            return Ok(());
        }

        peer.link.set_remote_description(answer).await?;
        peer.unsent_offer = None;
        peer.flush_pending_ice().await;
        info!("Applied answer from {}", from);

        if peer.renegotiation_pending {
            self.maybe_offer(from).await?;
        }
        Ok(())
    }

    async fn on_remote_ice(
        &mut self,
        from: &ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), EngineError> {
        self.ensure_peer(from).await?;
        let Some(peer) = self.peers.get_mut(from) else {
            return Err(EngineError::UnknownPeer(from.clone()));
        };

        if peer.link.has_remote_description().await {
            peer.link.add_ice_candidate(candidate).await?;
        } else {
            debug!("Queueing ICE candidate from {}", from);
            peer.pending_ice.push_back(candidate);
        }
        Ok(())
    }
}
