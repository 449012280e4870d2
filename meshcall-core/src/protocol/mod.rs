mod frames;

pub use frames::{ChatMessage, ClientFrame, ServerFrame};
