//! Presence Poller: the single task that owns a [`NegotiationEngine`].
//!
//! Participant snapshots, mailbox pages, link events and UI commands are all
//! funnelled through one `select!`, so the engine never sees two calls at once.

use futures::StreamExt;
use futures::channel::mpsc;
use huddle_core::engine::{LinkEvents, PeerConnector, SignalTransport};
use huddle_core::error::TransportError;
use huddle_core::media::{LocalTrack, TrackKind};
use huddle_core::NegotiationEngine;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ClientError;

pub const DEFAULT_PARTICIPANTS_INTERVAL: Duration = Duration::from_millis(2500);
pub const DEFAULT_SIGNALS_INTERVAL: Duration = Duration::from_millis(750);
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub participants_interval: Duration,
    pub signals_interval: Duration,
    pub fetch_limit: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            participants_interval: DEFAULT_PARTICIPANTS_INTERVAL,
            signals_interval: DEFAULT_SIGNALS_INTERVAL,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

/// Local media changes requested while the poller owns the engine.
#[derive(Debug, Clone)]
pub enum MediaCommand {
    SetMuted(TrackKind, bool),
    StartScreenShare(LocalTrack),
    StopScreenShare,
    AttachTrack(LocalTrack),
}

pub struct Poller<T, C: PeerConnector> {
    engine: NegotiationEngine<T, C>,
    links: LinkEvents,
    commands: mpsc::UnboundedReceiver<MediaCommand>,
    config: PollerConfig,
    cursor: u64,
}

impl<T, C> Poller<T, C>
where
    T: SignalTransport + 'static,
    C: PeerConnector,
{
    pub fn new(
        engine: NegotiationEngine<T, C>,
        links: LinkEvents,
        commands: mpsc::UnboundedReceiver<MediaCommand>,
        config: PollerConfig,
    ) -> Self {
        Self {
            engine,
            links,
            commands,
            config,
            cursor: 0,
        }
    }

    /// Highest mailbox seq consumed so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn engine(&self) -> &NegotiationEngine<T, C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut NegotiationEngine<T, C> {
        &mut self.engine
    }

    /// One full round outside of [`Self::run`]: queued link events and
    /// commands, then presence, then one mailbox page.
    pub async fn step(&mut self) -> Result<(), ClientError> {
        while let Ok(Some(event)) = self.links.try_next() {
            self.engine.handle_link_event(event).await;
        }
        while let Ok(Some(command)) = self.commands.try_next() {
            self.apply(command).await;
        }
        self.poll_participants().await?;
        self.poll_signals().await
    }

    /// Polls until `cancel` fires or the server revokes the credentials,
    /// then releases every connection. Only a cancelled run posts `leave`.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), ClientError> {
        info!(
            "Poller started for {} in room {}",
            self.engine.local_id(),
            self.engine.credentials().room_id
        );

        let mut participants_tick = tokio::time::interval(self.config.participants_interval);
        participants_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut signals_tick = tokio::time::interval(self.config.signals_interval);
        signals_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break Ok(()),

                Some(event) = self.links.next() => {
                    self.engine.handle_link_event(event).await;
                }

                Some(command) = self.commands.next() => {
                    self.apply(command).await;
                }

                _ = participants_tick.tick() => {
                    if let Err(e) = self.poll_participants().await {
                        break Err(e);
                    }
                }

                _ = signals_tick.tick() => {
                    if let Err(e) = self.poll_signals().await {
                        break Err(e);
                    }
                }
            }
        };

        self.engine.close_all().await;
        match &result {
            Ok(()) => {
                let credentials = self.engine.credentials().clone();
                if let Err(e) = self.engine.transport().leave(&credentials).await {
                    warn!("Leave request failed: {}", e);
                }
                info!("Poller stopped for {}", credentials.participant_id);
            }
            Err(e) => warn!("Poller stopped: {}", e),
        }
        result
    }

    /// One presence round. Only `Unauthorized` is returned; everything else
    /// waits for the next tick.
    pub async fn poll_participants(&mut self) -> Result<(), ClientError> {
        let participants = match self
            .engine
            .transport()
            .participants(self.engine.credentials())
            .await
        {
            Ok(participants) => participants,
            Err(e) => return self.tolerate(e),
        };
        self.engine.sync_participants(&participants).await;
        Ok(())
    }

    /// Fetches one page after the cursor and feeds it to the engine in order.
    pub async fn poll_signals(&mut self) -> Result<(), ClientError> {
        let page = match self
            .engine
            .transport()
            .fetch(self.engine.credentials(), self.cursor, self.config.fetch_limit)
            .await
        {
            Ok(page) => page,
            Err(e) => return self.tolerate(e),
        };

        for signal in &page.signals {
            if let Err(e) = self.engine.handle_signal(signal).await {
                warn!(
                    "Failed to handle {} #{} from {}: {}",
                    signal.kind.as_str(),
                    signal.seq,
                    signal.from_participant_id,
                    e
                );
            }
        }

        if page.next_after_seq > self.cursor {
            debug!("Cursor {} -> {}", self.cursor, page.next_after_seq);
            self.cursor = page.next_after_seq;
        }
        Ok(())
    }

    fn tolerate(&self, e: TransportError) -> Result<(), ClientError> {
        match e {
            TransportError::Unauthorized(_) => Err(e.into()),
            e => {
                warn!("Poll failed, retrying next tick: {}", e);
                Ok(())
            }
        }
    }

    async fn apply(&mut self, command: MediaCommand) {
        match command {
            MediaCommand::SetMuted(kind, muted) => {
                if !self.engine.set_muted(kind, muted) {
                    debug!("No local {:?} track to mute", kind);
                }
            }
            MediaCommand::StartScreenShare(track) => self.engine.start_screen_share(track).await,
            MediaCommand::StopScreenShare => self.engine.stop_screen_share().await,
            MediaCommand::AttachTrack(track) => self.engine.attach_track(track).await,
        }
    }
}
