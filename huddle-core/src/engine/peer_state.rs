use std::collections::VecDeque;
use tracing::warn;

use crate::engine::{LinkState, PeerLink};
use crate::model::{IceCandidate, ParticipantId, SessionDescription};

/// Everything the engine tracks for one remote participant.
pub struct PeerState<L> {
    pub(crate) remote_id: ParticipantId,
    pub(crate) link: L,
    /// Candidates that arrived before the remote description, in arrival order.
    pub(crate) pending_ice: VecDeque<IceCandidate>,
    pub(crate) is_making_offer: bool,
    /// Local offer whose post failed; re-posted on the next presence tick.
    pub(crate) unsent_offer: Option<SessionDescription>,
    /// A local media change needs an offer once the pair is back to stable.
    pub(crate) renegotiation_pending: bool,
    pub(crate) link_state: LinkState,
}

impl<L: PeerLink> PeerState<L> {
    pub(crate) fn new(remote_id: ParticipantId, link: L) -> Self {
        Self {
            remote_id,
            link,
            pending_ice: VecDeque::new(),
            is_making_offer: false,
            unsent_offer: None,
            renegotiation_pending: false,
            link_state: LinkState::New,
        }
    }

    pub fn remote_id(&self) -> &ParticipantId {
        &self.remote_id
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn pending_ice_len(&self) -> usize {
        self.pending_ice.len()
    }

    pub fn is_making_offer(&self) -> bool {
        self.is_making_offer
    }

    pub fn renegotiation_pending(&self) -> bool {
        self.renegotiation_pending
    }

    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    /// Applies queued candidates in the order they were received.
    pub(crate) async fn flush_pending_ice(&mut self) {
        while let Some(candidate) = self.pending_ice.pop_front() {
            if let Err(e) = self.link.add_ice_candidate(candidate).await {
                warn!(
                    "Failed to apply queued ICE candidate for {}: {}",
                    self.remote_id, e
                );
            }
        }
    }
}
