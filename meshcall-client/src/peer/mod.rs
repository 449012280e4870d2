mod negotiation_error;
mod negotiation_state;
mod negotiation_state_machine;
mod peer_connection;
mod peer_connection_entry;
mod peer_connection_registry;
mod peer_worker;

pub use negotiation_error::*;
pub use negotiation_state::*;
pub use negotiation_state_machine::*;
pub use peer_connection::*;
pub use peer_connection_entry::*;
pub use peer_connection_registry::*;
pub use peer_worker::PeerInput;
