use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use huddle_core::model::wire::{
    FetchResponse, JoinRequest, JoinResponse, LeaveRequest, ParticipantsResponse,
    PostSignalRequest, PostSignalResponse,
};
use huddle_core::model::{IssuedIdentity, ParticipantId, SignalKind};
use huddle_server::{AppState, Config, build_routes};

/// In-process server driven through `tower::ServiceExt::oneshot`.
#[derive(Clone)]
pub struct TestServer {
    router: Router,
    pub state: Arc<AppState>,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let state = Arc::new(AppState::from_config(&config));
        Self {
            router: build_routes(state.clone()),
            state,
        }
    }

    /// Sends one request and returns the status and the JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body)?)
            .await
            .context("router failed")?;

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response is not JSON")?
        };
        Ok((status, value))
    }

    async fn expect_ok<T: DeserializeOwned>(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let (status, value) = self.send(method, uri, body).await?;
        anyhow::ensure!(status == StatusCode::OK, "{} {}: {}", uri, status, value);
        Ok(serde_json::from_value(value)?)
    }

    pub async fn join(&self, room: &str, name: Option<&str>) -> Result<JoinResponse> {
        let body = to_json(&JoinRequest {
            display_name: name.map(str::to_string),
        })?;
        self.expect_ok(Method::POST, &format!("/rooms/{room}/join"), Some(body))
            .await
    }

    pub async fn participants(&self, room: &str, me: &IssuedIdentity) -> Result<ParticipantsResponse> {
        let uri = format!(
            "/rooms/{room}/participants?participantId={}&secret={}",
            me.id,
            me.secret.as_str()
        );
        self.expect_ok(Method::GET, &uri, None).await
    }

    pub async fn fetch(
        &self,
        room: &str,
        me: &IssuedIdentity,
        after_seq: u64,
        limit: Option<u32>,
    ) -> Result<FetchResponse> {
        let mut uri = format!(
            "/rooms/{room}/signal?participantId={}&secret={}&afterSeq={after_seq}",
            me.id,
            me.secret.as_str()
        );
        if let Some(limit) = limit {
            uri.push_str(&format!("&limit={limit}"));
        }
        self.expect_ok(Method::GET, &uri, None).await
    }

    pub fn signal_body(
        from: &IssuedIdentity,
        to: Option<&ParticipantId>,
        kind: SignalKind,
        payload: Value,
    ) -> Result<Value> {
        to_json(&PostSignalRequest {
            participant_id: from.id.clone(),
            secret: from.secret.clone(),
            to_participant_id: to.cloned(),
            kind,
            payload,
        })
    }

    pub async fn post(
        &self,
        room: &str,
        from: &IssuedIdentity,
        to: Option<&ParticipantId>,
        kind: SignalKind,
        payload: Value,
    ) -> Result<PostSignalResponse> {
        let body = Self::signal_body(from, to, kind, payload)?;
        self.expect_ok(Method::POST, &format!("/rooms/{room}/signal"), Some(body))
            .await
    }

    pub async fn leave(&self, room: &str, me: &IssuedIdentity) -> Result<(StatusCode, Value)> {
        let body = to_json(&LeaveRequest {
            participant_id: me.id.clone(),
            secret: me.secret.clone(),
        })?;
        self.send(Method::POST, &format!("/rooms/{room}/leave"), Some(body))
            .await
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
