mod digest;
mod file_receiver;
mod file_sender;
mod progress;

pub use digest::*;
pub use file_receiver::*;
pub use file_sender::*;
pub use progress::*;
