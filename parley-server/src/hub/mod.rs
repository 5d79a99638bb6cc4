mod call_router;
mod dispatch;
mod hub;
mod hub_command;
mod hub_handle;

pub use call_router::*;
pub use dispatch::*;
pub use hub::*;
pub use hub_command::*;
pub use hub_handle::*;
