pub mod client;
pub mod fallback;
pub mod sampler;

pub use client::{AnalysisOutcome, FrameAnalyzer, RemoteAnalyzer};
pub use sampler::{FrameSampler, SamplerConfig};
