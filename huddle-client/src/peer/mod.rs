mod track_registry;
mod webrtc_connector;
mod webrtc_link;

pub use track_registry::*;
pub use webrtc_connector::*;
pub use webrtc_link::*;
