use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::info;

use super::error::MediaError;
use super::frame::VideoFrame;

/// Track kind within a device stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A single device track. `live` is cleared exactly once when the track is
/// stopped; `enabled` can be toggled freely without stopping capture.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    kind: TrackKind,
    live: Arc<AtomicBool>,
    enabled: Arc<AtomicBool>,
}

impl MediaTrack {
    pub(crate) fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            live: Arc::new(AtomicBool::new(true)),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub(crate) fn live_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }
}

/// One encoded media fragment emitted while recording
#[derive(Debug, Clone)]
pub struct MediaChunk {
    pub data: Vec<u8>,
    pub timestamp_ms: u64,
}

/// The finalized, immutable recording of one session
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Shared handle between a stream and its backend's chunk producer task.
/// Chunks flow only while `recording` is set and a sender is installed.
pub(crate) struct ChunkFeed {
    recording: AtomicBool,
    tx: Mutex<Option<mpsc::UnboundedSender<MediaChunk>>>,
}

impl ChunkFeed {
    pub(crate) fn new() -> Self {
        Self {
            recording: AtomicBool::new(false),
            tx: Mutex::new(None),
        }
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub(crate) fn send(&self, chunk: MediaChunk) {
        if let Some(tx) = self.tx.lock().unwrap().as_ref() {
            let _ = tx.send(chunk);
        }
    }
}

/// An acquired camera/microphone stream.
///
/// Exclusively owned: at most one live stream exists per session, and all
/// tracks are stopped on `release()` or drop so no capture indicator is
/// left lit on any exit path.
pub struct DeviceStream {
    video: Option<MediaTrack>,
    audio: Option<MediaTrack>,
    frames: watch::Receiver<Option<VideoFrame>>,
    feed: Arc<ChunkFeed>,
    mime_type: String,
}

impl DeviceStream {
    pub(crate) fn new(
        video: Option<MediaTrack>,
        audio: Option<MediaTrack>,
        frames: watch::Receiver<Option<VideoFrame>>,
        feed: Arc<ChunkFeed>,
        mime_type: String,
    ) -> Self {
        Self {
            video,
            audio,
            frames,
            feed,
            mime_type,
        }
    }

    /// Latest-frame channel for the sampler. Holds `None` while no live,
    /// enabled video surface is available.
    pub fn frames(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frames.clone()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn video_track(&self) -> Option<&MediaTrack> {
        self.video.as_ref()
    }

    pub fn audio_track(&self) -> Option<&MediaTrack> {
        self.audio.as_ref()
    }

    /// Toggle the camera track without re-acquiring the stream
    pub fn set_video_enabled(&self, enabled: bool) {
        if let Some(track) = &self.video {
            track.set_enabled(enabled);
        }
    }

    /// Toggle the microphone track without re-acquiring the stream
    pub fn set_audio_enabled(&self, enabled: bool) {
        if let Some(track) = &self.audio {
            track.set_enabled(enabled);
        }
    }

    /// Number of tracks still live (0 after release)
    pub fn live_track_count(&self) -> usize {
        [&self.video, &self.audio]
            .into_iter()
            .flatten()
            .filter(|t| t.is_live())
            .count()
    }

    /// Begin emitting recorded chunks. Fails if a recorder is already
    /// running on this stream or every track has been stopped.
    pub fn start_recorder(&self) -> Result<mpsc::UnboundedReceiver<MediaChunk>, MediaError> {
        if self.live_track_count() == 0 {
            return Err(MediaError::Recorder("stream has no live tracks".into()));
        }

        let mut tx_slot = self.feed.tx.lock().unwrap();
        if tx_slot.is_some() {
            return Err(MediaError::Recorder("recorder already started".into()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *tx_slot = Some(tx);
        drop(tx_slot);

        self.feed.recording.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    /// Stop chunk emission and close the chunk channel
    pub fn stop_recorder(&self) {
        self.feed.recording.store(false, Ordering::SeqCst);
        self.feed.tx.lock().unwrap().take();
    }

    /// Stop every track. Idempotent; also runs on drop.
    pub fn release(&self) {
        self.stop_recorder();

        let mut stopped = 0;
        for track in [&self.video, &self.audio].into_iter().flatten() {
            if track.is_live() {
                track.stop();
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!("released device stream ({} tracks stopped)", stopped);
        }
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_with_tracks() -> DeviceStream {
        let (_tx, rx) = watch::channel(None);
        DeviceStream::new(
            Some(MediaTrack::new(TrackKind::Video)),
            Some(MediaTrack::new(TrackKind::Audio)),
            rx,
            Arc::new(ChunkFeed::new()),
            "video/webm".to_string(),
        )
    }

    #[test]
    fn release_stops_all_tracks() {
        let stream = stream_with_tracks();
        assert_eq!(stream.live_track_count(), 2);

        stream.release();
        assert_eq!(stream.live_track_count(), 0);

        // Idempotent
        stream.release();
        assert_eq!(stream.live_track_count(), 0);
    }

    #[test]
    fn toggling_does_not_stop_tracks() {
        let stream = stream_with_tracks();

        stream.set_video_enabled(false);
        assert!(!stream.video_track().unwrap().is_enabled());
        assert_eq!(stream.live_track_count(), 2);

        stream.set_video_enabled(true);
        assert!(stream.video_track().unwrap().is_enabled());
    }

    #[test]
    fn recorder_cannot_be_started_twice() {
        let stream = stream_with_tracks();

        let _rx = stream.start_recorder().unwrap();
        assert!(matches!(
            stream.start_recorder(),
            Err(MediaError::Recorder(_))
        ));
    }

    #[test]
    fn recorder_requires_live_tracks() {
        let stream = stream_with_tracks();
        stream.release();
        assert!(stream.start_recorder().is_err());
    }

    #[test]
    fn stop_recorder_closes_chunk_channel() {
        let stream = stream_with_tracks();
        let mut rx = stream.start_recorder().unwrap();

        stream.stop_recorder();
        assert!(rx.try_recv().is_err());

        // A fresh recorder can start after the previous one stopped
        assert!(stream.start_recorder().is_ok());
    }
}
