mod presence_directory;
mod room_registry;

pub use presence_directory::*;
pub use room_registry::*;
