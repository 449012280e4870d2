use crate::media::{MediaHandle, MediaStream, MediaTrack, TrackKind, TrackSource};
use std::sync::{Arc, OnceLock};

/// Session-scoped silent/blank stream for hosts without capture devices.
///
/// Some negotiation stacks refuse to complete a handshake without at least one
/// track, so outbound connections always get something to attach.
#[derive(Debug, Default)]
pub struct PlaceholderMediaSource {
    stream: OnceLock<MediaHandle>,
}

impl PlaceholderMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built on first call, then the same handle for the lifetime of the source.
    pub fn acquire(&self) -> MediaHandle {
        self.stream
            .get_or_init(|| {
                Arc::new(MediaStream::new(vec![
                    MediaTrack::new(TrackKind::Audio, "silence", TrackSource::Inert),
                    MediaTrack::new(TrackKind::Video, "black", TrackSource::Inert),
                ]))
            })
            .clone()
    }
}
