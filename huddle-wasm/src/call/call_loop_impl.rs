use futures::channel::mpsc;
use futures::{FutureExt, StreamExt};
use huddle_core::engine::{LinkEvent, LinkEvents, SignalTransport};
use huddle_core::error::TransportError;
use huddle_core::media::TrackKind;
use huddle_core::{NegotiationEngine, PeerEvent};
use wasm_bindgen::JsValue;

use crate::call::{
    CallCommand, FETCH_LIMIT, MediaCommand, PARTICIPANTS_INTERVAL_MS, SIGNALS_INTERVAL_MS,
};
use crate::events::EventSink;
use crate::logger::Logger;
use crate::peer::{BrowserConnector, LocalTracks};
use crate::transport::FetchTransport;
use crate::utils::sleep;

type Engine = NegotiationEngine<FetchTransport, BrowserConnector>;

enum Exit {
    /// `None` when nobody waits for the result, e.g. the page dropped the
    /// handle without calling `leave`.
    Leave(Option<futures::channel::oneshot::Sender<()>>),
    Revoked(TransportError),
}

enum Wake {
    Tick(Result<(), JsValue>),
    Command(Option<CallCommand>),
    Link(Option<LinkEvent>),
}

pub(crate) struct CallLoop {
    engine: Engine,
    links: LinkEvents,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    commands: mpsc::UnboundedReceiver<CallCommand>,
    sink: EventSink,
    tracks: LocalTracks,
    cursor: u64,
}

impl CallLoop {
    pub(crate) fn new(
        engine: Engine,
        links: LinkEvents,
        events: mpsc::UnboundedReceiver<PeerEvent>,
        commands: mpsc::UnboundedReceiver<CallCommand>,
        sink: EventSink,
        tracks: LocalTracks,
    ) -> Self {
        Self {
            engine,
            links,
            events,
            commands,
            sink,
            tracks,
            cursor: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        self.forward_events();
        let mut next_presence = 0.0;

        let exit = loop {
            let now = js_sys::Date::now();
            if now >= next_presence {
                next_presence = now + PARTICIPANTS_INTERVAL_MS;
                if let Err(e) = self.poll_participants().await {
                    break Exit::Revoked(e);
                }
            }
            if let Err(e) = self.poll_signals().await {
                break Exit::Revoked(e);
            }
            self.forward_events();

            if let Some(exit) = self.wait(SIGNALS_INTERVAL_MS).await {
                break exit;
            }
        };

        self.shutdown(exit).await;
    }

    /// Serves commands and link events until the next tick is due.
    async fn wait(&mut self, ms: i32) -> Option<Exit> {
        let tick = sleep(ms).fuse();
        futures::pin_mut!(tick);

        loop {
            let wake = futures::select! {
                slept = tick => Wake::Tick(slept),
                command = self.commands.next() => Wake::Command(command),
                event = self.links.next() => Wake::Link(event),
            };

            match wake {
                Wake::Tick(Ok(())) => return None,
                Wake::Tick(Err(e)) => {
                    // Without timers the loop would spin.
                    Logger::error("Timer failed, ending call", &e);
                    return Some(Exit::Leave(None));
                }
                Wake::Command(Some(CallCommand::Media(command))) => self.apply(command).await,
                Wake::Command(Some(CallCommand::Leave(done))) => {
                    return Some(Exit::Leave(Some(done)));
                }
                Wake::Command(None) => return Some(Exit::Leave(None)),
                Wake::Link(Some(event)) => self.engine.handle_link_event(event).await,
                Wake::Link(None) => {}
            }
            self.forward_events();
        }
    }

    async fn poll_participants(&mut self) -> Result<(), TransportError> {
        let participants = match self
            .engine
            .transport()
            .participants(self.engine.credentials())
            .await
        {
            Ok(participants) => participants,
            Err(e) => return tolerate(e),
        };
        self.engine.sync_participants(&participants).await;
        Ok(())
    }

    async fn poll_signals(&mut self) -> Result<(), TransportError> {
        let page = match self
            .engine
            .transport()
            .fetch(self.engine.credentials(), self.cursor, FETCH_LIMIT)
            .await
        {
            Ok(page) => page,
            Err(e) => return tolerate(e),
        };

        for signal in &page.signals {
            if let Err(e) = self.engine.handle_signal(signal).await {
                Logger::warn(&format!(
                    "Failed to handle {} #{} from {}: {}",
                    signal.kind.as_str(),
                    signal.seq,
                    signal.from_participant_id,
                    e
                ));
            }
        }
        self.cursor = self.cursor.max(page.next_after_seq);
        Ok(())
    }

    async fn apply(&mut self, command: MediaCommand) {
        match command {
            MediaCommand::SetMuted(kind, muted) => {
                if !self.engine.set_muted(kind, muted) {
                    Logger::debug(&format!("No local {:?} track to mute", kind));
                    return;
                }
                let media = self.engine.media();
                let track = match kind {
                    TrackKind::Audio => media.audio.as_ref(),
                    TrackKind::Video => media.camera.as_ref(),
                };
                if let Some(track) = track {
                    self.tracks.sync_enabled(track);
                }
            }
            MediaCommand::StartScreenShare(track) => {
                let previous = self.engine.media().screen.clone();
                self.engine.start_screen_share(track).await;
                if let Some(previous) = previous {
                    self.tracks.stop(previous.id());
                }
            }
            MediaCommand::StopScreenShare(only) => {
                let Some(screen) = self.engine.media().screen.clone() else {
                    return;
                };
                if only.is_some_and(|id| id != screen.id()) {
                    return;
                }
                self.engine.stop_screen_share().await;
                self.tracks.stop(screen.id());
            }
            MediaCommand::AttachTrack(track) => {
                let media = self.engine.media();
                let previous = match track.kind() {
                    TrackKind::Audio => media.audio.clone(),
                    TrackKind::Video => media.camera.clone(),
                };
                self.engine.attach_track(track.clone()).await;
                if let Some(previous) = previous.filter(|p| p.id() != track.id()) {
                    self.tracks.stop(previous.id());
                }
            }
        }
    }

    async fn shutdown(&mut self, exit: Exit) {
        self.engine.close_all().await;
        self.tracks.stop_all();
        self.forward_events();

        match exit {
            Exit::Leave(done) => {
                if let Err(e) = self
                    .engine
                    .transport()
                    .leave(self.engine.credentials())
                    .await
                {
                    Logger::warn(&format!("Leave request failed: {}", e));
                }
                Logger::info(&format!("Left room {}", self.engine.credentials().room_id));
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            Exit::Revoked(e) => {
                Logger::warn(&format!("Call ended: {}", e));
                self.sink.ended("unauthorized");
            }
        }
    }

    fn forward_events(&mut self) {
        while let Ok(Some(event)) = self.events.try_next() {
            self.sink.peer_event(&event);
        }
    }
}

/// Only `Unauthorized` ends the call; anything else waits for the next tick.
fn tolerate(e: TransportError) -> Result<(), TransportError> {
    match e {
        TransportError::Unauthorized(_) => Err(e),
        e => {
            Logger::warn(&format!("Poll failed, retrying next tick: {}", e));
            Ok(())
        }
    }
}
