mod peer_driver;
mod peer_event;

pub use peer_driver::*;
pub use peer_event::*;
