pub use meshcall_core::{ParticipantId, RoomHandle};

pub mod model {
    pub use meshcall_core::model::*;
}

pub mod protocol {
    pub use meshcall_core::protocol::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshcall_server::*;
}
