pub mod mock_connection;
pub mod mock_relay;

pub use mock_connection::*;
pub use mock_relay::*;
pub use test_participant::*;
