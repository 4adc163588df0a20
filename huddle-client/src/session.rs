use futures::StreamExt;
use futures::channel::mpsc;
use huddle_core::engine::{PeerConnector, SignalTransport};
use huddle_core::media::{LocalMedia, LocalTrack, TrackKind};
use huddle_core::model::{Credentials, IceServerConfig, IssuedIdentity, Participant, RoomId};
use huddle_core::{NegotiationEngine, PeerEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::info;

use crate::error::ClientError;
use crate::poller::{MediaCommand, Poller, PollerConfig};

/// One participant's membership in a room, from join to leave.
///
/// Dropping the session stops the poller just like [`CallSession::leave`],
/// without waiting for it.
pub struct CallSession {
    identity: IssuedIdentity,
    room: RoomId,
    others: Vec<Participant>,
    ice_servers: Vec<IceServerConfig>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    commands: mpsc::UnboundedSender<MediaCommand>,
    task: JoinHandle<Result<(), ClientError>>,
    stop: DropGuard,
}

impl CallSession {
    pub async fn join<T, C>(
        transport: Arc<T>,
        connector: C,
        room: RoomId,
        display_name: Option<&str>,
        media: LocalMedia,
    ) -> Result<Self, ClientError>
    where
        T: SignalTransport + 'static,
        C: PeerConnector + 'static,
    {
        Self::join_with_config(
            transport,
            connector,
            room,
            display_name,
            media,
            PollerConfig::default(),
        )
        .await
    }

    /// Joins `room`, connects to everybody already present and hands the
    /// engine to a freshly spawned poller.
    pub async fn join_with_config<T, C>(
        transport: Arc<T>,
        connector: C,
        room: RoomId,
        display_name: Option<&str>,
        media: LocalMedia,
        config: PollerConfig,
    ) -> Result<Self, ClientError>
    where
        T: SignalTransport + 'static,
        C: PeerConnector + 'static,
    {
        let joined = transport.join(&room, display_name).await?;
        info!(
            "Joined room {} as {} ({})",
            room, joined.participant.id, joined.participant.display_name
        );

        let credentials = Credentials {
            room_id: room.clone(),
            participant_id: joined.participant.id.clone(),
            secret: joined.participant.secret.clone(),
        };
        let (mut engine, links) = NegotiationEngine::new(credentials, transport, connector, media);
        let events = engine.subscribe();

        // No need to wait for the first presence tick.
        for other in &joined.others {
            engine.observe_peer(&other.id).await;
        }

        let (commands, command_rx) = mpsc::unbounded();
        let cancel = CancellationToken::new();
        let poller = Poller::new(engine, links, command_rx, config);
        let task = tokio::spawn(poller.run(cancel.clone()));

        Ok(Self {
            identity: joined.participant,
            room,
            others: joined.others,
            ice_servers: joined.ice_servers,
            events,
            commands,
            task,
            stop: cancel.drop_guard(),
        })
    }

    pub fn identity(&self) -> &IssuedIdentity {
        &self.identity
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Participants that were present at join time.
    pub fn others_at_join(&self) -> &[Participant] {
        &self.others
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    /// Next peer event. `None` once the poller has stopped.
    pub async fn next_event(&mut self) -> Option<PeerEvent> {
        self.events.next().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn set_muted(&self, kind: TrackKind, muted: bool) -> Result<(), ClientError> {
        self.send(MediaCommand::SetMuted(kind, muted))
    }

    pub fn start_screen_share(&self, track: LocalTrack) -> Result<(), ClientError> {
        self.send(MediaCommand::StartScreenShare(track))
    }

    pub fn stop_screen_share(&self) -> Result<(), ClientError> {
        self.send(MediaCommand::StopScreenShare)
    }

    pub fn attach_track(&self, track: LocalTrack) -> Result<(), ClientError> {
        self.send(MediaCommand::AttachTrack(track))
    }

    /// Stops polling, closes every connection, disables local tracks and
    /// posts `leave`. Returns the poller's own error if it had already
    /// stopped, e.g. because the server revoked the credentials.
    pub async fn leave(self) -> Result<(), ClientError> {
        let CallSession { task, stop, .. } = self;
        drop(stop);
        task.await.map_err(|e| ClientError::Task(e.to_string()))?
    }

    fn send(&self, command: MediaCommand) -> Result<(), ClientError> {
        self.commands
            .unbounded_send(command)
            .map_err(|_| ClientError::Task("poller has stopped".to_string()))
    }
}
