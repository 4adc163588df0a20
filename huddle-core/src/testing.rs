//! In-memory stand-ins for the engine's seams.
//!
//! [`ScriptedLink`] follows the WebRTC signaling state machine closely enough
//! to catch out-of-order calls, without any networking. [`RecordingTransport`]
//! records every post instead of sending it.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::engine::{
    LinkEvent, LinkEventSender, LinkState, PeerConnector, PeerLink, SignalTransport,
    SignalingState, TrackSwap,
};
use crate::error::{LinkError, TransportError};
use crate::media::{LocalMedia, LocalTrack, TrackKind};
use crate::model::wire::{FetchResponse, JoinResponse};
use crate::model::{
    Credentials, IceCandidate, IssuedIdentity, OutgoingSignal, Participant, ParticipantId,
    RoomId, SdpType, Secret, SessionDescription, Signal,
};

#[derive(Debug)]
struct LinkInner {
    signaling: SignalingState,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    applied_ice: Vec<IceCandidate>,
    /// Kinds with a sendrecv transceiver, and the track id currently on it.
    senders: HashMap<TrackKind, Option<String>>,
    offers_created: usize,
    closed: bool,
}

#[derive(Clone)]
pub struct ScriptedLink {
    remote: ParticipantId,
    events: LinkEventSender,
    inner: Arc<Mutex<LinkInner>>,
}

impl ScriptedLink {
    /// Every kind gets a sender, idle when `media` has no track for it.
    pub fn new(remote: ParticipantId, media: &LocalMedia, events: LinkEventSender) -> Self {
        Self::build(remote, media, events, true)
    }

    /// Kinds missing from `media` are receive-only and have no sender.
    pub fn receive_only(
        remote: ParticipantId,
        media: &LocalMedia,
        events: LinkEventSender,
    ) -> Self {
        Self::build(remote, media, events, false)
    }

    fn build(
        remote: ParticipantId,
        media: &LocalMedia,
        events: LinkEventSender,
        idle_senders: bool,
    ) -> Self {
        let mut senders = HashMap::new();
        for kind in [TrackKind::Audio, TrackKind::Video] {
            match media.outgoing(kind) {
                Some(track) => {
                    senders.insert(kind, Some(track.id().to_owned()));
                }
                None if idle_senders => {
                    senders.insert(kind, None);
                }
                None => {}
            }
        }
        Self {
            remote,
            events,
            inner: Arc::new(Mutex::new(LinkInner {
                signaling: SignalingState::Stable,
                local_description: None,
                remote_description: None,
                applied_ice: Vec::new(),
                senders,
                offers_created: 0,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LinkInner> {
        self.inner.lock().expect("scripted link poisoned")
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn applied_ice(&self) -> Vec<IceCandidate> {
        self.lock().applied_ice.clone()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.lock().remote_description.clone()
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.lock().local_description.clone()
    }

    pub fn offers_created(&self) -> usize {
        self.lock().offers_created
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Track id on the sender of `kind`; `None` if there is no sender.
    pub fn sending(&self, kind: TrackKind) -> Option<Option<String>> {
        self.lock().senders.get(&kind).cloned()
    }

    /// Reports a transport state change as the real connection would.
    pub fn emit_state(&self, state: LinkState) {
        let _ = self
            .events
            .unbounded_send(LinkEvent::StateChanged(self.remote.clone(), state));
    }

    /// Reports a locally gathered candidate.
    pub fn generate_candidate(&self, candidate: IceCandidate) {
        let _ = self
            .events
            .unbounded_send(LinkEvent::CandidateGenerated(self.remote.clone(), candidate));
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PeerLink for ScriptedLink {
    async fn create_offer(&self) -> Result<SessionDescription, LinkError> {
        let mut inner = self.lock();
        if inner.signaling != SignalingState::Stable {
            return Err(LinkError::InvalidState(format!("{:?}", inner.signaling)));
        }
        inner.offers_created += 1;
        let offer = SessionDescription::offer(format!(
            "offer-to-{}-{}",
            self.remote, inner.offers_created
        ));
        inner.local_description = Some(offer.clone());
        inner.signaling = SignalingState::HaveLocalOffer;
        Ok(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, LinkError> {
        let mut inner = self.lock();
        if inner.signaling != SignalingState::HaveRemoteOffer {
            return Err(LinkError::InvalidState(format!("{:?}", inner.signaling)));
        }
        let answer = SessionDescription::answer(format!("answer-to-{}", self.remote));
        inner.local_description = Some(answer.clone());
        inner.signaling = SignalingState::Stable;
        Ok(answer)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), LinkError> {
        let mut inner = self.lock();
        let next = match (desc.sdp_type, inner.signaling) {
            (SdpType::Offer, SignalingState::Stable) => SignalingState::HaveRemoteOffer,
            (SdpType::Answer, SignalingState::HaveLocalOffer) => SignalingState::Stable,
            (kind, state) => {
                return Err(LinkError::InvalidState(format!(
                    "{:?} description in {:?}",
                    kind, state
                )));
            }
        };
        inner.remote_description = Some(desc);
        inner.signaling = next;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), LinkError> {
        let mut inner = self.lock();
        if inner.remote_description.is_none() {
            return Err(LinkError::Ice("no remote description".into()));
        }
        inner.applied_ice.push(candidate);
        Ok(())
    }

    fn signaling_state(&self) -> SignalingState {
        self.lock().signaling
    }

    async fn has_remote_description(&self) -> bool {
        self.lock().remote_description.is_some()
    }

    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Option<&LocalTrack>,
    ) -> Result<TrackSwap, LinkError> {
        let mut inner = self.lock();
        let id = track.map(|t| t.id().to_owned());
        match inner.senders.insert(kind, id) {
            Some(_) => Ok(TrackSwap::Replaced),
            None => Ok(TrackSwap::NeedsRenegotiation),
        }
    }

    async fn close(&self) -> Result<(), LinkError> {
        let mut inner = self.lock();
        inner.closed = true;
        inner.signaling = SignalingState::Closed;
        Ok(())
    }
}

/// Hands out [`ScriptedLink`]s and keeps a handle to each for assertions.
#[derive(Default)]
pub struct ScriptedConnector {
    links: Mutex<Vec<ScriptedLink>>,
    fail: AtomicBool,
    receive_only: AtomicBool,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_connects(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Builds later links with [`ScriptedLink::receive_only`].
    pub fn receive_only_missing_kinds(&self, receive_only: bool) {
        self.receive_only.store(receive_only, Ordering::SeqCst);
    }

    pub fn links(&self) -> Vec<ScriptedLink> {
        self.links.lock().expect("connector poisoned").clone()
    }

    /// Most recent link created for `remote`.
    pub fn link_for(&self, remote: &ParticipantId) -> Option<ScriptedLink> {
        self.links()
            .into_iter()
            .rev()
            .find(|link| link.remote() == remote)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PeerConnector for Arc<ScriptedConnector> {
    type Link = ScriptedLink;

    async fn connect(
        &self,
        remote: &ParticipantId,
        media: &LocalMedia,
        events: LinkEventSender,
    ) -> Result<ScriptedLink, LinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LinkError::Connection("connect refused".into()));
        }
        let link = if self.receive_only.load(Ordering::SeqCst) {
            ScriptedLink::receive_only(remote.clone(), media, events)
        } else {
            ScriptedLink::new(remote.clone(), media, events)
        };
        self.links
            .lock()
            .expect("connector poisoned")
            .push(link.clone());
        Ok(link)
    }
}

/// Accepts every post and remembers it. Fetch and presence return whatever
/// was queued with [`Self::queue_signal`] and [`Self::set_participants`].
#[derive(Default)]
pub struct RecordingTransport {
    posted: Mutex<Vec<OutgoingSignal>>,
    participants: Mutex<Vec<Participant>>,
    inbox: Mutex<Vec<Signal>>,
    next_seq: AtomicU64,
    fail_posts: AtomicBool,
    unauthorized: AtomicBool,
    left: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    /// Makes every authenticated call return `Unauthorized`.
    pub fn revoke(&self) {
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    pub fn has_left(&self) -> bool {
        self.left.load(Ordering::SeqCst)
    }

    pub fn set_participants(&self, participants: Vec<Participant>) {
        *self.participants.lock().expect("transport poisoned") = participants;
    }

    pub fn queue_signal(&self, signal: Signal) {
        self.inbox.lock().expect("transport poisoned").push(signal);
    }

    /// Drains everything posted so far.
    pub fn take_posted(&self) -> Vec<OutgoingSignal> {
        std::mem::take(&mut *self.posted.lock().expect("transport poisoned"))
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(TransportError::Unauthorized("revoked".into()));
        }
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SignalTransport for RecordingTransport {
    async fn join(
        &self,
        _room: &RoomId,
        display_name: Option<&str>,
    ) -> Result<JoinResponse, TransportError> {
        let id = ParticipantId::generate();
        Ok(JoinResponse {
            participant: IssuedIdentity {
                id,
                secret: Secret::generate(),
                display_name: display_name.unwrap_or("Guest").to_owned(),
                is_guest: display_name.is_none(),
            },
            others: self.participants.lock().expect("transport poisoned").clone(),
            ice_servers: Vec::new(),
        })
    }

    async fn participants(
        &self,
        _credentials: &Credentials,
    ) -> Result<Vec<Participant>, TransportError> {
        self.check()?;
        Ok(self.participants.lock().expect("transport poisoned").clone())
    }

    async fn fetch(
        &self,
        _credentials: &Credentials,
        after_seq: u64,
        limit: u32,
    ) -> Result<FetchResponse, TransportError> {
        self.check()?;
        let signals: Vec<Signal> = self
            .inbox
            .lock()
            .expect("transport poisoned")
            .iter()
            .filter(|s| s.seq > after_seq)
            .take(limit as usize)
            .cloned()
            .collect();
        let next_after_seq = signals.last().map_or(after_seq, |s| s.seq);
        Ok(FetchResponse {
            signals,
            next_after_seq,
        })
    }

    async fn post(
        &self,
        _credentials: &Credentials,
        signal: &OutgoingSignal,
    ) -> Result<u64, TransportError> {
        self.check()?;
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection reset".into()));
        }
        self.posted
            .lock()
            .expect("transport poisoned")
            .push(signal.clone());
        Ok(self.next_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn leave(&self, _credentials: &Credentials) -> Result<(), TransportError> {
        self.left.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Turns a recorded post into the mailbox entry a recipient would fetch.
pub fn deliver(from: &ParticipantId, seq: u64, signal: &OutgoingSignal) -> Signal {
    Signal {
        seq,
        kind: signal.kind,
        payload: signal.payload.clone(),
        from_participant_id: from.clone(),
        to_participant_id: signal.to.clone(),
        created_at: Utc::now(),
    }
}

pub fn participant(id: &str) -> Participant {
    Participant {
        id: ParticipantId::from(id),
        display_name: format!("User {id}"),
        is_guest: false,
        created_at: Utc::now(),
    }
}

pub fn credentials(room: &str, id: &str) -> Credentials {
    Credentials {
        room_id: RoomId::parse(room).expect("valid room id"),
        participant_id: ParticipantId::from(id),
        secret: Secret::generate(),
    }
}
