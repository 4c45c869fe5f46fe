use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while recording to a WAV artifact.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The input could not be opened: permission denied, device busy, or an
    /// unsupported parameter combination.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("a recording session is already active")]
    AlreadyRecording,

    #[error("no active recording session")]
    NoActiveSession,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("i/o error: {0}")]
    IoError(String),

    #[error("device read failed: {0}")]
    DeviceReadError(String),

    #[error("timed out waiting for the capture loop to exit")]
    Timeout,

    /// Capture ended early. The artifact at `path` was still finalized with the
    /// bytes captured up to the failure.
    #[error("capture interrupted after {pcm_bytes} bytes ({}): {cause}", path.display())]
    CaptureInterrupted {
        path: PathBuf,
        pcm_bytes: u64,
        cause: Box<CaptureError>,
    },
}

impl CaptureError {
    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        Self::IoError(format!("{}: {}", context, err))
    }
}
