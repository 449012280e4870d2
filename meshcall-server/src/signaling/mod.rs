mod server;
mod ws_handler;

pub use server::*;
pub use ws_handler::*;
