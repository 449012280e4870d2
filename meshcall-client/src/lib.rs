pub mod media;
pub mod peer;
pub mod room;
pub mod session;
pub mod signaling;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use media::*;
pub use peer::*;
pub use room::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
