use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant};
use tracing::info;

use super::backend::{MediaBackend, MediaBackendConfig, MediaConstraints};
use super::error::MediaError;
use super::frame::VideoFrame;
use super::stream::{ChunkFeed, DeviceStream, MediaChunk, MediaTrack, TrackKind};

/// Bytes of generated payload per chunk, after the 4-byte sequence header
const CHUNK_PAYLOAD_BYTES: usize = 4096;

/// Deterministic in-process media source.
///
/// Produces solid-color frames that drift over time and fixed-size recorded
/// chunks, standing in for a real camera/microphone so the capture pipeline
/// can run headless and under a paused test clock.
pub struct SyntheticBackend {
    config: MediaBackendConfig,
    /// Injected acquisition failure, for exercising the denied/unavailable paths
    fail_with: Option<MediaError>,
    /// Live flags of the previously acquired stream's tracks
    previous: Vec<Arc<AtomicBool>>,
}

impl SyntheticBackend {
    pub fn new(config: MediaBackendConfig) -> Self {
        Self {
            config,
            fail_with: None,
            previous: Vec::new(),
        }
    }

    /// A backend whose every acquisition attempt fails with `error`
    pub fn failing(config: MediaBackendConfig, error: MediaError) -> Self {
        Self {
            config,
            fail_with: Some(error),
            previous: Vec::new(),
        }
    }

    fn spawn_frame_task(
        &self,
        track: MediaTrack,
        frames_tx: watch::Sender<Option<VideoFrame>>,
    ) {
        let width = self.config.frame_width;
        let height = self.config.frame_height;
        let period = Duration::from_millis(self.config.frame_interval_ms);

        tokio::spawn(async move {
            let start = Instant::now();
            let mut ticker = interval(period);
            let mut tick: u64 = 0;

            loop {
                ticker.tick().await;

                if !track.is_live() {
                    let _ = frames_tx.send(None);
                    break;
                }
                if !track.is_enabled() {
                    // Disabled camera: no frame surface to sample from
                    let _ = frames_tx.send(None);
                    continue;
                }

                let shade = (tick % 256) as u8;
                let frame = VideoFrame::solid(
                    width,
                    height,
                    [shade, 96, 255 - shade],
                    start.elapsed().as_millis() as u64,
                );
                let _ = frames_tx.send(Some(frame));
                tick += 1;
            }
        });
    }

    fn spawn_chunk_task(&self, tracks: Vec<MediaTrack>, feed: Arc<ChunkFeed>) {
        let period = Duration::from_millis(self.config.chunk_interval_ms);

        tokio::spawn(async move {
            let start = Instant::now();
            let mut ticker = interval(period);
            let mut seq: u32 = 0;

            loop {
                ticker.tick().await;

                if !tracks.iter().any(|t| t.is_live()) {
                    break;
                }
                if !feed.is_recording() {
                    continue;
                }

                let mut data = Vec::with_capacity(CHUNK_PAYLOAD_BYTES + 4);
                data.extend_from_slice(&seq.to_le_bytes());
                data.resize(CHUNK_PAYLOAD_BYTES + 4, 0x5A);

                feed.send(MediaChunk {
                    data,
                    timestamp_ms: start.elapsed().as_millis() as u64,
                });
                seq += 1;
            }
        });
    }
}

#[async_trait]
impl MediaBackend for SyntheticBackend {
    async fn acquire(&mut self, constraints: MediaConstraints) -> Result<DeviceStream, MediaError> {
        // Stop any previously held stream before requesting a new one
        for live in self.previous.drain(..) {
            live.store(false, Ordering::SeqCst);
        }

        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }

        let video = constraints.video.then(|| MediaTrack::new(TrackKind::Video));
        let audio = constraints.audio.then(|| MediaTrack::new(TrackKind::Audio));

        if video.is_none() && audio.is_none() {
            return Err(MediaError::DeviceUnavailable);
        }

        let (frames_tx, frames_rx) = watch::channel(None);
        let feed = Arc::new(ChunkFeed::new());

        if let Some(track) = &video {
            self.spawn_frame_task(track.clone(), frames_tx);
        }

        let tracks: Vec<MediaTrack> = [&video, &audio].into_iter().flatten().cloned().collect();
        self.previous = tracks.iter().map(|t| t.live_flag()).collect();
        self.spawn_chunk_task(tracks, Arc::clone(&feed));

        info!(
            "acquired synthetic stream (video={}, audio={})",
            constraints.video, constraints.audio
        );

        Ok(DeviceStream::new(
            video,
            audio,
            frames_rx,
            feed,
            "video/webm".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
