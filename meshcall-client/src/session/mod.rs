mod session;
mod session_command;
mod session_config;
mod session_event;

pub use session::*;
pub use session_command::*;
pub use session_config::*;
pub use session_event::*;
