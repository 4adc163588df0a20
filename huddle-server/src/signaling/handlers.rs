use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use huddle_core::model::RoomId;
use huddle_core::model::wire::{
    FetchQuery, FetchResponse, HealthResponse, IceServersResponse, JoinRequest, JoinResponse,
    LeaveRequest, OkResponse, ParticipantsQuery, ParticipantsResponse, PostSignalRequest,
    PostSignalResponse,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::SignalingError;
use crate::signaling::AppState;

fn room_id(raw: String) -> Result<RoomId, SignalingError> {
    RoomId::parse(raw).map_err(|e| SignalingError::BadRequest(e.to_string()))
}

fn query<T>(extracted: Result<Query<T>, QueryRejection>) -> Result<T, SignalingError> {
    extracted
        .map(|Query(value)| value)
        .map_err(|rejection| SignalingError::BadRequest(rejection.body_text()))
}

fn json<T>(extracted: Result<Json<T>, JsonRejection>) -> Result<T, SignalingError> {
    extracted
        .map(|Json(value)| value)
        .map_err(|rejection| SignalingError::BadRequest(rejection.body_text()))
}

/// `POST /rooms/{room_id}/join`. The body may be empty.
pub async fn join(
    State(state): State<Arc<AppState>>,
    Path(raw_room): Path<String>,
    body: Bytes,
) -> Result<Json<JoinResponse>, SignalingError> {
    let room = room_id(raw_room)?;
    let request: JoinRequest = if body.iter().all(u8::is_ascii_whitespace) {
        JoinRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| SignalingError::BadRequest(e.to_string()))?
    };

    let (participant, others) = state.rooms.join(&room, request.display_name.as_deref());
    Ok(Json(JoinResponse {
        participant,
        others,
        ice_servers: state.ice_servers.clone(),
    }))
}

/// `GET /rooms/{room_id}/participants`. Doubles as the heartbeat.
pub async fn participants(
    State(state): State<Arc<AppState>>,
    Path(raw_room): Path<String>,
    params: Result<Query<ParticipantsQuery>, QueryRejection>,
) -> Result<Json<ParticipantsResponse>, SignalingError> {
    let room = room_id(raw_room)?;
    let params = query(params)?;
    let participants = state
        .rooms
        .participants(&room, &params.participant_id, &params.secret)?;
    Ok(Json(ParticipantsResponse { participants }))
}

/// `GET /rooms/{room_id}/signal`
pub async fn fetch_signals(
    State(state): State<Arc<AppState>>,
    Path(raw_room): Path<String>,
    params: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Json<FetchResponse>, SignalingError> {
    let room = room_id(raw_room)?;
    let params = query(params)?;
    Ok(Json(state.rooms.fetch(&room, &params)?))
}

/// `POST /rooms/{room_id}/signal`
pub async fn post_signal(
    State(state): State<Arc<AppState>>,
    Path(raw_room): Path<String>,
    body: Result<Json<PostSignalRequest>, JsonRejection>,
) -> Result<Json<PostSignalResponse>, SignalingError> {
    let room = room_id(raw_room)?;
    let request = json(body)?;
    let seq = state.rooms.post(&room, request).inspect_err(|e| {
        if !matches!(e, SignalingError::Unauthorized(_)) {
            warn!("Rejected signal in room {}: {}", room, e);
        }
    })?;
    Ok(Json(PostSignalResponse { ok: true, seq }))
}

/// `POST /rooms/{room_id}/leave`
pub async fn leave(
    State(state): State<Arc<AppState>>,
    Path(raw_room): Path<String>,
    body: Result<Json<LeaveRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, SignalingError> {
    let room = room_id(raw_room)?;
    let request = json(body)?;
    state
        .rooms
        .leave(&room, &request.participant_id, &request.secret)?;
    Ok(Json(OkResponse { ok: true }))
}

/// `GET /ice-servers`
pub async fn ice_servers(State(state): State<Arc<AppState>>) -> Json<IceServersResponse> {
    Json(IceServersResponse {
        ice_servers: state.ice_servers.clone(),
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn not_found() -> SignalingError {
    SignalingError::NotFound("no such endpoint".to_string())
}
