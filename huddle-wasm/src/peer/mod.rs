mod browser_connector;
mod browser_link;
mod local_tracks;

pub use browser_connector::*;
pub use browser_link::*;
pub use local_tracks::*;
