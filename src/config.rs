use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub analyzer: AnalyzerConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Remote emotion-analysis endpoint settings
#[derive(Debug, Deserialize)]
pub struct AnalyzerConfig {
    pub endpoint: String,
    pub interval_ms: u64,
    pub request_timeout_secs: u64,
}

/// Media acquisition and recording defaults
#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub video: bool,
    pub audio: bool,
    pub countdown_secs: u8,
    pub jpeg_quality: u8,
    pub publish_behavior_metrics: bool,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_interval_ms: u64,
    pub chunk_interval_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
