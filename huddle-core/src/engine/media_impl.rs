use tracing::{debug, info, warn};

use crate::election;
use crate::engine::{NegotiationEngine, PeerConnector, PeerLink, SignalTransport, TrackSwap};
use crate::media::{LocalTrack, TrackKind};
use crate::model::ParticipantId;

impl<T, C> NegotiationEngine<T, C>
where
    T: SignalTransport,
    C: PeerConnector,
{
    /// Toggles the local track's enabled flag. Nothing is signaled.
    pub fn set_muted(&mut self, kind: TrackKind, muted: bool) -> bool {
        let changed = self.media.set_muted(kind, muted);
        if changed {
            debug!("{:?} muted={}", kind, muted);
        }
        changed
    }

    /// Sends `track` in place of the camera on every connection.
    pub async fn start_screen_share(&mut self, track: LocalTrack) {
        info!("Starting screen share with track {}", track.id());
        self.media.screen = Some(track);
        self.push_outgoing(TrackKind::Video).await;
    }

    /// Restores the camera track (or nothing) on every connection.
    pub async fn stop_screen_share(&mut self) {
        let Some(screen) = self.media.screen.take() else {
            return;
        };
        screen.set_enabled(false);
        info!("Stopped screen share");
        self.push_outgoing(TrackKind::Video).await;
    }

    /// Installs a new microphone or camera track, e.g. after the user granted
    /// a device late.
    pub async fn attach_track(&mut self, track: LocalTrack) {
        let kind = track.kind();
        match kind {
            TrackKind::Audio => self.media.audio = Some(track),
            TrackKind::Video => self.media.camera = Some(track),
        }
        self.push_outgoing(kind).await;
    }

    async fn push_outgoing(&mut self, kind: TrackKind) {
        let outgoing = self.media.outgoing(kind).cloned();
        let mut renegotiate: Vec<ParticipantId> = Vec::new();

        let local = self.credentials.participant_id.clone();
        for (remote, peer) in self.peers.iter_mut() {
            match peer.link.replace_track(kind, outgoing.as_ref()).await {
                Ok(TrackSwap::Replaced) => {}
                Ok(TrackSwap::NeedsRenegotiation) if election::is_offerer(&local, remote) => {
                    peer.renegotiation_pending = true;
                    renegotiate.push(remote.clone());
                }
                // Only the offerer may renegotiate the pair.
                Ok(TrackSwap::NeedsRenegotiation) => warn!(
                    "No {:?} sender towards {} and only {} can renegotiate",
                    kind, remote, remote
                ),
                Err(e) => warn!("Failed to swap {:?} track for {}: {}", kind, remote, e),
            }
        }

        for remote in renegotiate {
            if let Err(e) = self.maybe_offer(&remote).await {
                warn!("Renegotiation offer to {} failed: {}", remote, e);
            }
        }
    }
}
