mod app;
mod config;
mod hub;
mod registry;
mod signaling;

pub use app::*;
pub use config::*;
pub use hub::*;
pub use registry::*;
pub use signaling::*;
