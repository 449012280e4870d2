pub mod config;
pub mod relay;
pub mod signaling;

pub use config::*;
pub use relay::*;
pub use signaling::*;
