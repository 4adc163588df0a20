pub mod election;
pub mod engine;
pub mod error;
pub mod media;
pub mod model;
pub mod utils;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use engine::{NegotiationEngine, PeerEvent, RemovalReason};
pub use error::{EngineError, LinkError, ModelError, TransportError};
