//! Native participant: reqwest signaling transport, webrtc-rs connections
//! and a tokio poller driving the negotiation engine.

pub mod error;
pub mod peer;
pub mod poller;
pub mod session;
pub mod transport;

pub use error::ClientError;
pub use peer::{TrackRegistry, WebRtcConnector, WebRtcLink};
pub use poller::{MediaCommand, Poller, PollerConfig};
pub use session::CallSession;
pub use transport::HttpTransport;
