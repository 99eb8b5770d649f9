use thiserror::Error;

/// Errors from media acquisition and recording.
///
/// Acquisition failures are terminal for that attempt: the session surfaces
/// them as a persistent inline error and the user must toggle a control (or
/// recreate the session) to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("camera or microphone permission denied")]
    PermissionDenied,

    #[error("no capture device available")]
    DeviceUnavailable,

    #[error("recorder error: {0}")]
    Recorder(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),
}
