use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no capture device available: {0}")]
    MediaUnavailable(String),

    #[error("capture permission denied")]
    PermissionDenied,
}
