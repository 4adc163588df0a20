use axum::Router;
use axum::routing::{get, post};
use huddle_core::model::IceServerConfig;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::room::{RoomManager, RoomSettings};
use crate::signaling::handlers;

/// Shared by every handler.
pub struct AppState {
    pub rooms: RoomManager,
    pub ice_servers: Vec<IceServerConfig>,
}

impl AppState {
    pub fn new(rooms: RoomManager, ice_servers: Vec<IceServerConfig>) -> Self {
        Self { rooms, ice_servers }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RoomManager::new(RoomSettings::from(config)),
            config.ice_servers(),
        )
    }
}

/// Builds the HTTP surface:
/// - `POST /rooms/{room_id}/join`
/// - `GET /rooms/{room_id}/participants`
/// - `GET|POST /rooms/{room_id}/signal`
/// - `POST /rooms/{room_id}/leave`
/// - `GET /ice-servers`, `GET /health`
pub fn build_routes(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/rooms/{room_id}/join", post(handlers::join))
        .route("/rooms/{room_id}/participants", get(handlers::participants))
        .route(
            "/rooms/{room_id}/signal",
            get(handlers::fetch_signals).post(handlers::post_signal),
        )
        .route("/rooms/{room_id}/leave", post(handlers::leave))
        .route("/ice-servers", get(handlers::ice_servers))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
