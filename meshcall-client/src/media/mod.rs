mod local_media_source;
mod media_error;
mod media_stream;
mod placeholder_media_source;

pub use local_media_source::*;
pub use media_error::*;
pub use media_stream::*;
pub use placeholder_media_source::*;
