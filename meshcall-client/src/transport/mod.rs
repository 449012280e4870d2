mod rtc_connection_factory;
mod transport_config;

pub use rtc_connection_factory::*;
pub use transport_config::*;
