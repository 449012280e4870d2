mod signaling_channel_adapter;
mod signaling_transport;
mod ws_transport;

pub use signaling_channel_adapter::*;
pub use signaling_transport::*;
pub use ws_transport::*;
