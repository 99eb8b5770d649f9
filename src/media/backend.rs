use async_trait::async_trait;

use super::error::MediaError;
use super::stream::DeviceStream;

/// Which tracks to request when acquiring a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Configuration for a media backend
#[derive(Debug, Clone)]
pub struct MediaBackendConfig {
    /// Width of produced frames in pixels
    pub frame_width: u32,
    /// Height of produced frames in pixels
    pub frame_height: u32,
    /// Camera frame cadence in milliseconds
    pub frame_interval_ms: u64,
    /// Recorder chunk cadence in milliseconds
    pub chunk_interval_ms: u64,
}

impl Default for MediaBackendConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            frame_interval_ms: 100, // ~10 fps
            chunk_interval_ms: 250,
        }
    }
}

/// Media capture backend trait
///
/// Implementations:
/// - Synthetic: deterministic generated frames/chunks (tests, headless runs)
/// - Real camera/microphone backends are platform collaborators and live
///   outside this crate
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Request camera/microphone access.
    ///
    /// Any stream previously acquired from this backend is stopped first,
    /// so at most one acquisition is ever live.
    async fn acquire(&mut self, constraints: MediaConstraints) -> Result<DeviceStream, MediaError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Media device selector
#[derive(Debug, Clone)]
pub enum MediaDevice {
    /// Generated frames and chunks (tests, headless runs)
    Synthetic,
    /// Physical camera/microphone (not wired into this build)
    Camera,
}

/// Media backend factory
pub struct MediaBackendFactory;

impl MediaBackendFactory {
    pub fn create(
        device: MediaDevice,
        config: MediaBackendConfig,
    ) -> Result<Box<dyn MediaBackend>, MediaError> {
        match device {
            MediaDevice::Synthetic => Ok(Box::new(super::synthetic::SyntheticBackend::new(config))),
            MediaDevice::Camera => Err(MediaError::DeviceUnavailable),
        }
    }
}
