mod mailbox;
mod registry;
mod room;
mod room_manager;

pub use mailbox::*;
pub use registry::*;
pub use room::*;
pub use room_manager::*;
