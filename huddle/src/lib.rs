pub use huddle_core::model::{ParticipantId, RoomId};
pub use huddle_core::{NegotiationEngine, PeerEvent, RemovalReason};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod engine {
    pub use huddle_core::engine::*;
    pub use huddle_core::media::*;
}

pub mod utils {
    pub use huddle_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}

#[cfg(feature = "wasm")]
pub mod wasm {
    pub use huddle_wasm::*;
}
