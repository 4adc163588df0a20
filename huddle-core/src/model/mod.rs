mod credentials;
mod peer;
mod room;
mod signaling;
pub mod wire;

pub use credentials::{Credentials, Secret};
pub use peer::{IssuedIdentity, Participant, ParticipantId};
pub use room::{MAX_ROOM_ID_LEN, RoomId};
pub use signaling::{
    IceCandidate, IceServerConfig, LeavePayload, OutgoingSignal, SdpType, SessionDescription,
    Signal, SignalKind,
};
