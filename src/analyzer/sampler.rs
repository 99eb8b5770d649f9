use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::client::{AnalysisOutcome, FrameAnalyzer};
use super::fallback;
use crate::media::VideoFrame;
use crate::metrics::MetricsPublisher;

/// Frame sampler configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Sampling period; the first sample fires one full period after start
    pub interval: Duration,
    /// JPEG quality for the submitted frame (0-100)
    pub jpeg_quality: u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            jpeg_quality: 80,
        }
    }
}

/// Periodic capture-analyze-publish loop.
///
/// Runs only while a session is recording: the session starts the sampler on
/// entering `Recording` and stops it on leaving, nothing else does. A tick
/// with no live, enabled video frame is skipped silently. Ticks do not
/// serialize behind a slow analysis call; overlapping calls are allowed and
/// stale resolutions are discarded by the publisher's sequence guard.
pub struct FrameSampler {
    task: JoinHandle<()>,
}

impl FrameSampler {
    pub fn spawn(
        config: SamplerConfig,
        frames: watch::Receiver<Option<VideoFrame>>,
        analyzer: Arc<dyn FrameAnalyzer>,
        publisher: Arc<MetricsPublisher>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval(config.interval);
            // Consume the immediate tick so sampling starts one period in
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let frame = { frames.borrow().clone() };
                let Some(frame) = frame else {
                    continue;
                };

                let data_url = match frame.to_data_url(config.jpeg_quality) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("failed to encode frame for analysis: {}", e);
                        continue;
                    }
                };

                let sequence = publisher.next_sequence();
                let analyzer = Arc::clone(&analyzer);
                let publisher = Arc::clone(&publisher);

                tokio::spawn(async move {
                    let (facial, behavior) = match analyzer.analyze(&data_url).await {
                        AnalysisOutcome::Valid { facial, behavior } => (facial, behavior),
                        AnalysisOutcome::Invalid => fallback::synthesize(),
                    };

                    if !publisher.publish(sequence, facial, behavior) {
                        debug!(sequence, "sampling tick superseded before resolution");
                    }
                });
            }
        });

        info!("frame sampler started");
        Self { task }
    }

    /// Cancel future ticks. An already in-flight analysis call is not
    /// cancelled; its resolution is harmless-but-stale.
    pub fn stop(self) {
        info!("frame sampler stopped");
        drop(self);
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.task.abort();
    }
}
