use async_trait::async_trait;
use huddle_core::engine::SignalTransport;
use huddle_core::error::TransportError;
use huddle_core::model::wire::{
    ErrorResponse, FetchQuery, FetchResponse, IceServersResponse, JoinRequest, JoinResponse,
    LeaveRequest, OkResponse, ParticipantsQuery, ParticipantsResponse, PostSignalRequest,
    PostSignalResponse,
};
use huddle_core::model::{Credentials, IceServerConfig, OutgoingSignal, Participant, RoomId};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::ClientError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`SignalTransport`] over the server's JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// `server` is the base url, e.g. `http://localhost:3000`.
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let base = Url::parse(server)
            .map_err(|e| ClientError::InvalidServerUrl(format!("{server}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidServerUrl(server.to_string()));
        }
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /ice-servers`
    pub async fn ice_servers(&self) -> Result<Vec<IceServerConfig>, TransportError> {
        let response = self
            .client
            .get(self.endpoint(&["ice-servers"]))
            .send()
            .await
            .map_err(network)?;
        let body: IceServersResponse = decode(response).await?;
        Ok(body.ice_servers)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Only fails for cannot-be-a-base urls, rejected in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn room_endpoint(&self, room: &RoomId, action: &str) -> Url {
        self.endpoint(&["rooms", room.as_str(), action])
    }
}

fn network(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

/// Maps a response onto the transport error taxonomy: 401 is terminal, other
/// non-2xx statuses carry the server's error message.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()));
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    if status == StatusCode::UNAUTHORIZED {
        Err(TransportError::Unauthorized(message))
    } else {
        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SignalTransport for HttpTransport {
    async fn join(
        &self,
        room: &RoomId,
        display_name: Option<&str>,
    ) -> Result<JoinResponse, TransportError> {
        let request = JoinRequest {
            display_name: display_name.map(str::to_owned),
        };
        let response = self
            .client
            .post(self.room_endpoint(room, "join"))
            .json(&request)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn participants(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Participant>, TransportError> {
        let query = ParticipantsQuery {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
        };
        let response = self
            .client
            .get(self.room_endpoint(&credentials.room_id, "participants"))
            .query(&query)
            .send()
            .await
            .map_err(network)?;
        let body: ParticipantsResponse = decode(response).await?;
        Ok(body.participants)
    }

    async fn fetch(
        &self,
        credentials: &Credentials,
        after_seq: u64,
        limit: u32,
    ) -> Result<FetchResponse, TransportError> {
        let query = FetchQuery {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
            after_seq,
            limit: Some(limit),
        };
        let response = self
            .client
            .get(self.room_endpoint(&credentials.room_id, "signal"))
            .query(&query)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn post(
        &self,
        credentials: &Credentials,
        signal: &OutgoingSignal,
    ) -> Result<u64, TransportError> {
        let request = PostSignalRequest {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
            to_participant_id: signal.to.clone(),
            kind: signal.kind,
            payload: signal.payload.clone(),
        };
        let response = self
            .client
            .post(self.room_endpoint(&credentials.room_id, "signal"))
            .json(&request)
            .send()
            .await
            .map_err(network)?;
        let body: PostSignalResponse = decode(response).await?;
        Ok(body.seq)
    }

    async fn leave(&self, credentials: &Credentials) -> Result<(), TransportError> {
        let request = LeaveRequest {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
        };
        let response = self
            .client
            .post(self.room_endpoint(&credentials.room_id, "leave"))
            .json(&request)
            .send()
            .await
            .map_err(network)?;
        let _: OkResponse = decode(response).await?;
        debug!("Left room {}", credentials.room_id);
        Ok(())
    }
}
