pub mod local_transport;

pub use local_transport::*;
pub use test_call::*;
