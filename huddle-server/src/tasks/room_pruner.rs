//! Idle room pruning.
//!
//! Rooms are created implicitly and never deleted by clients. This task drops
//! rooms nobody is present in once they have been quiet for the configured
//! idle window. Live rooms are never touched, so a room's log is never
//! rewritten while anyone can still fetch from it.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::room::RoomManager;

/// Runs until `cancel_token` is cancelled.
pub async fn start_room_pruner(
    rooms: RoomManager,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    info!(
        "Starting room pruner (every {:?}, idle after {:?})",
        interval,
        rooms.settings().room_idle
    );

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pruned = rooms.prune_idle();
                if pruned > 0 {
                    info!("Pruned {} idle room(s), {} remaining", pruned, rooms.room_count());
                } else {
                    debug!("No idle rooms to prune");
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Room pruner received shutdown signal, exiting");
                break;
            }
        }
    }
}
