//! Browser bindings: `fetch` signaling, `RTCPeerConnection` links and the
//! exported [`HuddleCall`] handle. Everything here lives on the page's single
//! thread, so the crate is empty on native targets.
#![cfg(target_arch = "wasm32")]

pub mod call;
pub mod events;
pub mod logger;
pub mod peer;
pub mod transport;
mod utils;

pub use call::HuddleCall;
