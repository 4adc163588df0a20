pub mod config;
pub mod error;
pub mod room;
pub mod signaling;
pub mod tasks;

pub use config::{Config, ConfigError};
pub use error::SignalingError;
pub use room::{RoomManager, RoomSettings};
pub use signaling::{AppState, build_routes};

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Binds `config.bind_address`, starts the room pruner and serves until
/// `shutdown` is cancelled.
pub async fn serve(config: Config, shutdown: CancellationToken) -> std::io::Result<()> {
    let state = Arc::new(AppState::from_config(&config));

    let pruner = tokio::spawn(tasks::start_room_pruner(
        state.rooms.clone(),
        config.prune_interval(),
        shutdown.child_token(),
    ));

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Signaling server listening on http://{}", listener.local_addr()?);

    let result = axum::serve(listener, build_routes(state))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    shutdown.cancel();
    let _ = pruner.await;
    info!("Signaling server stopped");
    result
}
