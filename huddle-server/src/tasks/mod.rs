//! Background tasks of the signaling server.

pub mod room_pruner;

pub use room_pruner::start_room_pruner;
