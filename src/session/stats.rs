use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Statistics about a capture session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// When the current take entered `Recording`, if it did
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds spent recording the current take
    pub duration_secs: f64,

    /// Chunks buffered for the in-progress take
    pub chunks_buffered: usize,

    /// Metric snapshots delivered so far
    pub snapshots_published: u64,

    /// Persistent inline error, if acquisition or the recorder failed
    pub last_error: Option<String>,
}
