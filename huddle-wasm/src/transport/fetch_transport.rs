use async_trait::async_trait;
use huddle_core::engine::SignalTransport;
use huddle_core::error::TransportError;
use huddle_core::model::wire::{
    ErrorResponse, FetchResponse, IceServersResponse, JoinRequest, JoinResponse, LeaveRequest,
    OkResponse, ParticipantsResponse, PostSignalRequest, PostSignalResponse,
};
use huddle_core::model::{Credentials, IceServerConfig, OutgoingSignal, Participant, RoomId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response, Url};

use crate::utils::describe;

const UNAUTHORIZED: u16 = 401;

/// [`SignalTransport`] over the page's `fetch`.
#[derive(Debug, Clone)]
pub struct FetchTransport {
    base: String,
}

impl FetchTransport {
    /// `server` is the base url, e.g. `https://calls.example.org`.
    pub fn new(server: &str) -> Result<Self, JsValue> {
        // Validates the url up front; requests are built from the string.
        Url::new(server)?;
        Ok(Self {
            base: server.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /ice-servers`
    pub async fn ice_servers(&self) -> Result<Vec<IceServerConfig>, TransportError> {
        let url = format!("{}/ice-servers", self.base);
        let body: IceServersResponse = self.send("GET", &url, None).await?;
        Ok(body.ice_servers)
    }

    fn room_url(&self, room: &RoomId, action: &str) -> String {
        let room: String = js_sys::encode_uri_component(room.as_str()).into();
        format!("{}/rooms/{}/{}", self.base, room, action)
    }

    fn credentials_url(
        &self,
        credentials: &Credentials,
        action: &str,
        extra: &[(&str, String)],
    ) -> Result<String, TransportError> {
        let url = Url::new(&self.room_url(&credentials.room_id, action))
            .map_err(|e| TransportError::Network(describe(&e)))?;
        let params = url.search_params();
        params.append("participantId", credentials.participant_id.as_str());
        params.append("secret", credentials.secret.as_str());
        for (key, value) in extra {
            params.append(key, value);
        }
        Ok(url.href())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> Result<T, TransportError> {
        let response = fetch(method, url, body)
            .await
            .map_err(|e| TransportError::Network(describe(&e)))?;
        let status = response.status();
        let text = read_text(&response)
            .await
            .map_err(|e| TransportError::Network(describe(&e)))?;

        if response.ok() {
            return serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()));
        }

        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => body.error.message,
            Err(_) => response.status_text(),
        };
        if status == UNAUTHORIZED {
            Err(TransportError::Unauthorized(message))
        } else {
            Err(TransportError::Rejected { status, message })
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let body = serde_json::to_string(body).map_err(|e| TransportError::Decode(e.to_string()))?;
        self.send("POST", url, Some(body)).await
    }
}

async fn fetch(method: &str, url: &str, body: Option<String>) -> Result<Response, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let init = RequestInit::new();
    init.set_method(method);
    if let Some(body) = body {
        let headers = Headers::new()?;
        headers.set("Content-Type", "application/json")?;
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));
    }

    let request = Request::new_with_str_and_init(url, &init)?;
    let response = JsFuture::from(window.fetch_with_request(&request)).await?;
    response.dyn_into::<Response>()
}

async fn read_text(response: &Response) -> Result<String, JsValue> {
    let text = JsFuture::from(response.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

#[async_trait(?Send)]
impl SignalTransport for FetchTransport {
    async fn join(
        &self,
        room: &RoomId,
        display_name: Option<&str>,
    ) -> Result<JoinResponse, TransportError> {
        let request = JoinRequest {
            display_name: display_name.map(str::to_owned),
        };
        self.post_json(&self.room_url(room, "join"), &request).await
    }

    async fn participants(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Participant>, TransportError> {
        let url = self.credentials_url(credentials, "participants", &[])?;
        let body: ParticipantsResponse = self.send("GET", &url, None).await?;
        Ok(body.participants)
    }

    async fn fetch(
        &self,
        credentials: &Credentials,
        after_seq: u64,
        limit: u32,
    ) -> Result<FetchResponse, TransportError> {
        let url = self.credentials_url(
            credentials,
            "signal",
            &[
                ("afterSeq", after_seq.to_string()),
                ("limit", limit.to_string()),
            ],
        )?;
        self.send("GET", &url, None).await
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
        let url = self.room_url(&credentials.room_id, "signal");
        let body: PostSignalResponse = self.post_json(&url, &request).await?;
        Ok(body.seq)
    }

    async fn leave(&self, credentials: &Credentials) -> Result<(), TransportError> {
        let request = LeaveRequest {
            participant_id: credentials.participant_id.clone(),
            secret: credentials.secret.clone(),
        };
        let url = self.room_url(&credentials.room_id, "leave");
        let _: OkResponse = self.post_json(&url, &request).await?;
        Ok(())
    }
}
