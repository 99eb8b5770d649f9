pub mod analyzer;
pub mod config;
pub mod http;
pub mod media;
pub mod metrics;
pub mod session;

pub use analyzer::{AnalysisOutcome, FrameAnalyzer, FrameSampler, RemoteAnalyzer, SamplerConfig};
pub use config::Config;
pub use http::{create_router, AppState};
pub use media::{
    DeviceStream, MediaBackend, MediaBackendConfig, MediaBackendFactory, MediaBlob, MediaChunk,
    MediaConstraints, MediaDevice, MediaError, SyntheticBackend, VideoFrame,
};
pub use metrics::{
    BehaviorMetrics, CommunicationMetrics, FacialMetrics, HeadPose, MetricsPublisher,
    MetricsSnapshot,
};
pub use session::{CaptureSession, SessionConfig, SessionState, SessionStats, TakeSummary};
