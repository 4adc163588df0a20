mod fetch_transport;

pub use fetch_transport::*;
