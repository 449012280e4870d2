use crate::media::{MediaError, MediaHandle, PlaceholderMediaSource};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Device capabilities, queried once when a session starts.
pub trait CapabilityProbe: Send + Sync {
    fn has_camera(&self) -> bool;

    fn has_microphone(&self) -> bool;

    fn has_screen_share_support(&self) -> bool;
}

/// Opens real capture devices. Rendering and device access live outside this crate.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn open(&self, video: bool, audio: bool) -> Result<MediaHandle, MediaError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub camera: bool,
    pub microphone: bool,
    pub screen_share: bool,
}

impl Capabilities {
    pub fn probe(probe: &dyn CapabilityProbe) -> Self {
        Self {
            camera: probe.has_camera(),
            microphone: probe.has_microphone(),
            screen_share: probe.has_screen_share_support(),
        }
    }
}

impl CapabilityProbe for Capabilities {
    fn has_camera(&self) -> bool {
        self.camera
    }

    fn has_microphone(&self) -> bool {
        self.microphone
    }

    fn has_screen_share_support(&self) -> bool {
        self.screen_share
    }
}

/// Capture backend for headless hosts: no devices are reported and every open fails.
#[derive(Debug, Default)]
pub struct UnavailableCapture;

impl CapabilityProbe for UnavailableCapture {
    fn has_camera(&self) -> bool {
        false
    }

    fn has_microphone(&self) -> bool {
        false
    }

    fn has_screen_share_support(&self) -> bool {
        false
    }
}

#[async_trait]
impl MediaCapture for UnavailableCapture {
    async fn open(&self, _video: bool, _audio: bool) -> Result<MediaHandle, MediaError> {
        Err(MediaError::MediaUnavailable("headless host".to_owned()))
    }
}

/// The one stream a session attaches to every connection it creates.
#[derive(Debug, Clone)]
pub enum LocalMediaSource {
    Live(MediaHandle),
    Placeholder(MediaHandle),
}

impl LocalMediaSource {
    /// Queries `probe` once, then opens whatever devices it reported.
    pub async fn resolve(
        probe: &dyn CapabilityProbe,
        capture: &dyn MediaCapture,
        placeholder: &PlaceholderMediaSource,
    ) -> Self {
        let capabilities = Capabilities::probe(probe);
        debug!("Device capabilities: {:?}", capabilities);

        if !capabilities.camera && !capabilities.microphone {
            info!("No camera or microphone, using placeholder media");
            return Self::Placeholder(placeholder.acquire());
        }

        match capture
            .open(capabilities.camera, capabilities.microphone)
            .await
        {
            Ok(stream) => Self::Live(stream),
            Err(e) => {
                warn!("Capture failed ({}), falling back to placeholder media", e);
                Self::Placeholder(placeholder.acquire())
            }
        }
    }

    pub fn handle(&self) -> &MediaHandle {
        match self {
            Self::Live(h) | Self::Placeholder(h) => h,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}
