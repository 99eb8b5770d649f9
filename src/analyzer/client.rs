use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::metrics::{BehaviorMetrics, FacialMetrics, HeadPose};

/// Result of one analysis attempt.
///
/// Anything short of a 2xx response carrying both `metrics` and
/// `face_tracking` is `Invalid`; raw wire JSON never crosses this boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Valid {
        facial: FacialMetrics,
        behavior: BehaviorMetrics,
    },
    Invalid,
}

/// Seam between the sampler and the emotion-analysis endpoint
#[async_trait]
pub trait FrameAnalyzer: Send + Sync {
    /// Analyze one encoded frame. Failures are folded into
    /// `AnalysisOutcome::Invalid`; each tick is independent, with no retry.
    async fn analyze(&self, image_data_url: &str) -> AnalysisOutcome;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    image: &'a str,
}

// Loose wire shapes; validation happens when converting to AnalysisOutcome
#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    metrics: Option<WireMetrics>,
    face_tracking: Option<WireFaceTracking>,
}

#[derive(Debug, Deserialize)]
struct WireMetrics {
    #[serde(default)]
    confident: f32,
    #[serde(default)]
    stressed: f32,
    #[serde(default)]
    nervous: f32,
}

#[derive(Debug, Default, Deserialize)]
struct WireFaceTracking {
    #[serde(default)]
    blink_count: u32,
    #[serde(default)]
    looking_at_camera: bool,
    #[serde(default)]
    head_pose: WireHeadPose,
}

#[derive(Debug, Default, Deserialize)]
struct WireHeadPose {
    #[serde(default)]
    pitch: f32,
    #[serde(default)]
    yaw: f32,
    #[serde(default)]
    roll: f32,
}

impl AnalyzeResponse {
    fn into_outcome(self) -> AnalysisOutcome {
        let (metrics, face_tracking) = match (self.metrics, self.face_tracking) {
            (Some(m), Some(f)) => (m, f),
            _ => {
                debug!("analysis response missing metrics or face_tracking");
                return AnalysisOutcome::Invalid;
            }
        };

        // The endpoint reports fractions in [0,1]; consumers expect percents
        AnalysisOutcome::Valid {
            facial: FacialMetrics {
                confident: metrics.confident * 100.0,
                stressed: metrics.stressed * 100.0,
                nervous: metrics.nervous * 100.0,
            },
            behavior: BehaviorMetrics {
                blink_count: face_tracking.blink_count,
                looking_at_camera: face_tracking.looking_at_camera,
                head_pose: HeadPose {
                    pitch: face_tracking.head_pose.pitch,
                    yaw: face_tracking.head_pose.yaw,
                    roll: face_tracking.head_pose.roll,
                },
            },
        }
    }
}

/// HTTP client for the remote emotion-analysis endpoint
pub struct RemoteAnalyzer {
    endpoint: String,
    http: reqwest::Client,
}

impl RemoteAnalyzer {
    /// `timeout` bounds each analysis call; a timed out call resolves to
    /// `Invalid` like any other failure.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build analysis HTTP client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

#[async_trait]
impl FrameAnalyzer for RemoteAnalyzer {
    async fn analyze(&self, image_data_url: &str) -> AnalysisOutcome {
        let response = match self
            .http
            .post(&self.endpoint)
            .json(&AnalyzeRequest {
                image: image_data_url,
            })
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("analysis request failed: {}", e);
                return AnalysisOutcome::Invalid;
            }
        };

        if !response.status().is_success() {
            warn!("analysis endpoint returned {}", response.status());
            return AnalysisOutcome::Invalid;
        }

        match response.json::<AnalyzeResponse>().await {
            Ok(body) => body.into_outcome(),
            Err(e) => {
                warn!("failed to parse analysis response: {}", e);
                AnalysisOutcome::Invalid
            }
        }
    }
}
