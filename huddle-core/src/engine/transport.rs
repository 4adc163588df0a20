use async_trait::async_trait;

use crate::engine::MaybeSend;
use crate::error::TransportError;
use crate::model::wire::{FetchResponse, JoinResponse};
use crate::model::{Credentials, OutgoingSignal, Participant, RoomId};

/// Client side of the signaling relay.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SignalTransport: MaybeSend {
    async fn join(
        &self,
        room: &RoomId,
        display_name: Option<&str>,
    ) -> Result<JoinResponse, TransportError>;

    /// Present participants. Also acts as the heartbeat.
    async fn participants(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Participant>, TransportError>;

    async fn fetch(
        &self,
        credentials: &Credentials,
        after_seq: u64,
        limit: u32,
    ) -> Result<FetchResponse, TransportError>;

    /// Returns the seq the mailbox assigned.
    async fn post(
        &self,
        credentials: &Credentials,
        signal: &OutgoingSignal,
    ) -> Result<u64, TransportError>;

    async fn leave(&self, credentials: &Credentials) -> Result<(), TransportError>;
}
