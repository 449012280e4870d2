use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Shared reference to a stream. Connections attach the same handle, never a copy.
pub type MediaHandle = Arc<MediaStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    /// Backed by a real capture device.
    Capture,
    /// Silent audio or blank video that never carries content.
    Inert,
    /// Received from a remote participant.
    Remote,
}

#[derive(Debug)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    label: String,
    source: TrackSource,
    enabled: AtomicBool,
    ended: AtomicBool,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>, source: TrackSource) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), kind, label, source)
    }

    pub fn with_id(
        id: impl Into<String>,
        kind: TrackKind,
        label: impl Into<String>,
        source: TrackSource,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            source,
            enabled: AtomicBool::new(true),
            ended: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> TrackSource {
        self.source
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// While disabled, outbound samples for this track are dropped.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.ended.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), tracks)
    }

    pub fn with_id(id: impl Into<String>, tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    pub fn is_inert(&self) -> bool {
        self.tracks.iter().all(|t| t.source == TrackSource::Inert)
    }

    /// Mute or unmute every track of `kind`. Returns how many tracks were touched.
    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) -> usize {
        let mut touched = 0;
        for track in self.tracks_of(kind) {
            track.set_enabled(enabled);
            touched += 1;
        }
        touched
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}
