use super::config::SessionConfig;
use super::state::SessionState;
use super::stats::SessionStats;
use crate::analyzer::{FrameAnalyzer, FrameSampler, SamplerConfig};
use crate::media::{DeviceStream, MediaBackend, MediaBlob, MediaChunk, TrackKind};
use crate::metrics::{CommunicationMetrics, MetricsPublisher, MetricsSnapshot};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Everything a spawned countdown task needs to drive the recording
/// transition without holding the session itself
#[derive(Clone)]
struct RecordingShared {
    state: Arc<Mutex<SessionState>>,
    stream: Arc<Mutex<Option<DeviceStream>>>,
    sampler: Arc<Mutex<Option<FrameSampler>>>,
    chunks: Arc<Mutex<Vec<MediaChunk>>>,
    chunk_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    analyzer: Arc<dyn FrameAnalyzer>,
    publisher: Arc<MetricsPublisher>,
    sampler_config: SamplerConfig,
    started_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    last_error: Arc<Mutex<Option<String>>>,
}

/// Outcome of a successfully stopped take
#[derive(Debug, Clone)]
pub struct TakeSummary {
    /// Finalized blob size in bytes
    pub recording_bytes: usize,
    /// Statistics captured at the moment the take finalized, before the
    /// per-take counters reset
    pub stats: SessionStats,
}

/// One interview-recording session: owns the device stream, the
/// Idle → CountingDown → Recording → Stopped state machine, the frame
/// sampler lifecycle, and the chunk buffer for the in-progress take.
///
/// The sampler runs if and only if the state is `Recording`; entering and
/// leaving that state are the only places it is started or stopped.
pub struct CaptureSession {
    config: SessionConfig,
    backend: tokio::sync::Mutex<Box<dyn MediaBackend>>,
    shared: RecordingShared,
    countdown_task: Mutex<Option<JoinHandle<()>>>,
    recordings_tx: mpsc::UnboundedSender<MediaBlob>,
    recordings_rx: Mutex<Option<mpsc::UnboundedReceiver<MediaBlob>>>,
}

impl CaptureSession {
    /// Create a session and acquire its device stream.
    ///
    /// Acquisition failure is not fatal: the session is created in `Idle`
    /// with a persistent inline error, and a later track toggle retries.
    pub async fn new(
        config: SessionConfig,
        mut backend: Box<dyn MediaBackend>,
        analyzer: Arc<dyn FrameAnalyzer>,
    ) -> Self {
        info!("Creating capture session: {}", config.session_id);

        let last_error = Arc::new(Mutex::new(None));
        let stream = match backend.acquire(config.constraints).await {
            Ok(s) => Some(s),
            Err(e) => {
                error!("media acquisition failed: {}", e);
                *last_error.lock().unwrap() = Some(
                    "Could not access camera or microphone. Please check permissions.".to_string(),
                );
                None
            }
        };

        let (recordings_tx, recordings_rx) = mpsc::unbounded_channel();

        let shared = RecordingShared {
            state: Arc::new(Mutex::new(SessionState::Idle)),
            stream: Arc::new(Mutex::new(stream)),
            sampler: Arc::new(Mutex::new(None)),
            chunks: Arc::new(Mutex::new(Vec::new())),
            chunk_task: Arc::new(Mutex::new(None)),
            analyzer,
            publisher: Arc::new(MetricsPublisher::new(config.publish_behavior_metrics)),
            sampler_config: SamplerConfig {
                interval: config.sampling_interval,
                jpeg_quality: config.jpeg_quality,
            },
            started_at: Arc::new(Mutex::new(None)),
            last_error,
        };

        Self {
            config,
            backend: tokio::sync::Mutex::new(backend),
            shared,
            countdown_task: Mutex::new(None),
            recordings_tx,
            recordings_rx: Mutex::new(Some(recordings_rx)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock().unwrap()
    }

    /// Whether the frame sampler is currently active
    pub fn is_sampling(&self) -> bool {
        self.shared.sampler.lock().unwrap().is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.lock().unwrap().clone()
    }

    /// Register the metrics consumer (at most one; replaces any earlier one)
    pub fn subscribe_metrics(&self) -> mpsc::UnboundedReceiver<MetricsSnapshot> {
        self.shared.publisher.subscribe()
    }

    /// Take the finalized-recording receiver. Each completed take delivers
    /// exactly one blob on it.
    pub fn take_recordings(&self) -> Option<mpsc::UnboundedReceiver<MediaBlob>> {
        self.recordings_rx.lock().unwrap().take()
    }

    /// Most recent snapshot, for status queries
    pub fn latest_metrics(&self) -> Option<MetricsSnapshot> {
        self.shared.publisher.latest()
    }

    /// Replace the forwarded communication metrics (computed elsewhere)
    pub fn set_communication(&self, metrics: CommunicationMetrics) {
        self.shared.publisher.set_communication(metrics);
    }

    /// Begin the countdown toward recording.
    ///
    /// Valid only from `Idle`; any other state makes this a no-op, so a
    /// double-tapped start button cannot produce two countdowns.
    pub fn request_start(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if *state != SessionState::Idle {
                debug!("start request ignored in state {:?}", *state);
                return;
            }
            if self.shared.stream.lock().unwrap().is_none() {
                warn!("start requested with no media stream");
                *self.shared.last_error.lock().unwrap() =
                    Some("No camera or microphone stream; check permissions.".to_string());
                return;
            }
            *state = SessionState::CountingDown(self.config.countdown_secs);
        }

        info!(
            "countdown started ({}s): {}",
            self.config.countdown_secs, self.config.session_id
        );

        let handle = spawn_countdown(self.shared.clone());
        *self.countdown_task.lock().unwrap() = Some(handle);
    }

    /// Stop the in-progress recording, finalize the chunk buffer into one
    /// immutable blob, and deliver it to the consumer.
    ///
    /// Valid only from `Recording`; otherwise a no-op returning `None`.
    /// Returns a summary describing the completed take.
    pub async fn request_stop(&self) -> Option<TakeSummary> {
        {
            let mut state = self.shared.state.lock().unwrap();
            if *state != SessionState::Recording {
                debug!("stop request ignored in state {:?}", *state);
                return None;
            }
            *state = SessionState::Stopped;
        }

        // Sampling must never outlive the Recording state
        if let Some(sampler) = self.shared.sampler.lock().unwrap().take() {
            sampler.stop();
        }

        if let Some(stream) = self.shared.stream.lock().unwrap().as_ref() {
            stream.stop_recorder();
        }

        // Drain the chunk task; its channel closed when the recorder stopped
        let task = self.shared.chunk_task.lock().unwrap().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("chunk capture task panicked: {}", e);
            }
        }

        let chunks = std::mem::take(&mut *self.shared.chunks.lock().unwrap());
        let mime_type = self
            .shared
            .stream
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.mime_type().to_string())
            .unwrap_or_else(|| "video/webm".to_string());

        let mut data = Vec::new();
        for chunk in &chunks {
            data.extend_from_slice(&chunk.data);
        }
        let blob = MediaBlob { mime_type, data };
        let bytes = blob.len();

        info!(
            "recording stopped: {} ({} chunks, {} bytes)",
            self.config.session_id,
            chunks.len(),
            bytes
        );

        // Snapshot the take's stats before the per-take counters reset
        let started_at = *self.shared.started_at.lock().unwrap();
        let stats = SessionStats {
            session_id: self.config.session_id.clone(),
            state: SessionState::Idle,
            started_at,
            duration_secs: started_at
                .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
                .unwrap_or(0.0),
            chunks_buffered: chunks.len(),
            snapshots_published: self.shared.publisher.published_count(),
            last_error: self.last_error(),
        };

        // Deliver the finalized take exactly once, then return to Idle
        let _ = self.recordings_tx.send(blob);
        *self.shared.started_at.lock().unwrap() = None;
        *self.shared.state.lock().unwrap() = SessionState::Idle;

        Some(TakeSummary {
            recording_bytes: bytes,
            stats,
        })
    }

    /// Toggle the camera track. Never re-acquires while recording; if an
    /// earlier acquisition failed and the session is idle, this retries it.
    pub async fn set_video_enabled(&self, enabled: bool) {
        self.toggle_track(TrackKind::Video, enabled).await;
    }

    /// Toggle the microphone track (same re-acquisition rules as video)
    pub async fn set_audio_enabled(&self, enabled: bool) {
        self.toggle_track(TrackKind::Audio, enabled).await;
    }

    async fn toggle_track(&self, kind: TrackKind, enabled: bool) {
        let needs_acquire = {
            let state = *self.shared.state.lock().unwrap();
            state == SessionState::Idle && self.shared.stream.lock().unwrap().is_none()
        };
        if needs_acquire {
            self.reacquire().await;
        }

        if let Some(stream) = self.shared.stream.lock().unwrap().as_ref() {
            match kind {
                TrackKind::Video => stream.set_video_enabled(enabled),
                TrackKind::Audio => stream.set_audio_enabled(enabled),
            }
        }
    }

    /// Retry acquisition after an earlier failure. Only reachable while
    /// `Idle`; a live recording never has its stream torn down underneath it.
    async fn reacquire(&self) {
        let mut backend = self.backend.lock().await;
        match backend.acquire(self.config.constraints).await {
            Ok(stream) => {
                *self.shared.stream.lock().unwrap() = Some(stream);
                *self.shared.last_error.lock().unwrap() = None;
                info!("media stream reacquired: {}", self.config.session_id);
            }
            Err(e) => {
                error!("media reacquisition failed: {}", e);
                *self.shared.last_error.lock().unwrap() = Some(
                    "Could not access camera or microphone. Please check permissions.".to_string(),
                );
            }
        }
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        let started_at = *self.shared.started_at.lock().unwrap();
        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.state(),
            started_at,
            duration_secs: started_at
                .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
                .unwrap_or(0.0),
            chunks_buffered: self.shared.chunks.lock().unwrap().len(),
            snapshots_published: self.shared.publisher.published_count(),
            last_error: self.last_error(),
        }
    }

    /// Number of live device tracks (0 once released)
    pub fn live_track_count(&self) -> usize {
        self.shared
            .stream
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.live_track_count())
            .unwrap_or(0)
    }

    /// Tear the session down: abort timers and sampling, stop every device
    /// track. Runs on drop as well, so no exit path leaves a camera live.
    pub fn release(&self) {
        if let Some(task) = self.countdown_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(sampler) = self.shared.sampler.lock().unwrap().take() {
            sampler.stop();
        }
        if let Some(task) = self.shared.chunk_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(stream) = self.shared.stream.lock().unwrap().take() {
            stream.release();
        }
        *self.shared.state.lock().unwrap() = SessionState::Idle;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Tick the countdown once per second; on reaching zero, flip to
/// `Recording` and bring up the recorder and sampler together.
fn spawn_countdown(shared: RecordingShared) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(1));
        // interval's first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let entered = {
                let mut state = shared.state.lock().unwrap();
                match *state {
                    SessionState::CountingDown(n) if n > 1 => {
                        *state = SessionState::CountingDown(n - 1);
                        debug!("countdown: {}", n - 1);
                        false
                    }
                    SessionState::CountingDown(_) => {
                        *state = SessionState::Recording;
                        true
                    }
                    // Session was torn down mid-countdown
                    _ => return,
                }
            };

            if entered {
                enter_recording(&shared);
                return;
            }
        }
    })
}

fn enter_recording(shared: &RecordingShared) {
    *shared.started_at.lock().unwrap() = Some(Utc::now());
    info!("recording started");

    let stream_guard = shared.stream.lock().unwrap();

    match stream_guard.as_ref() {
        Some(stream) => match stream.start_recorder() {
            Ok(mut chunk_rx) => {
                let chunks = Arc::clone(&shared.chunks);
                let handle = tokio::spawn(async move {
                    while let Some(chunk) = chunk_rx.recv().await {
                        chunks.lock().unwrap().push(chunk);
                    }
                });
                *shared.chunk_task.lock().unwrap() = Some(handle);
            }
            Err(e) => {
                // Known gap: the logical state stays Recording while the
                // underlying capture may be inconsistent
                error!("could not start recorder: {}", e);
                *shared.last_error.lock().unwrap() =
                    Some(format!("Could not start recording: {}", e));
            }
        },
        None => {
            *shared.last_error.lock().unwrap() = Some("No media stream available.".to_string());
        }
    }

    let frames = stream_guard.as_ref().map(|s| s.frames());
    drop(stream_guard);

    if let Some(frames) = frames {
        let sampler = FrameSampler::spawn(
            shared.sampler_config.clone(),
            frames,
            Arc::clone(&shared.analyzer),
            Arc::clone(&shared.publisher),
        );
        *shared.sampler.lock().unwrap() = Some(sampler);
    }
}
