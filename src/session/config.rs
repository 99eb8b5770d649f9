use std::time::Duration;

use crate::media::MediaConstraints;

/// Configuration for a capture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "interview-2026-08-29-behavioral")
    pub session_id: String,

    /// Countdown length before recording begins, in seconds
    pub countdown_secs: u8,

    /// Frame sampling period while recording
    pub sampling_interval: Duration,

    /// JPEG quality for frames submitted to the analyzer (0-100)
    pub jpeg_quality: u8,

    /// Which tracks to request at acquisition
    pub constraints: MediaConstraints,

    /// Whether snapshots carry the extended face-tracking metrics.
    /// When disabled, behavior fields are zeroed.
    pub publish_behavior_metrics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            countdown_secs: 3,
            sampling_interval: Duration::from_millis(2000),
            jpeg_quality: 80,
            constraints: MediaConstraints::default(),
            publish_behavior_metrics: true,
        }
    }
}
