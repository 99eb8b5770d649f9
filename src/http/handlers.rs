use super::state::AppState;
use crate::analyzer::RemoteAnalyzer;
use crate::media::{MediaBackendConfig, MediaBackendFactory, MediaConstraints, MediaDevice};
use crate::session::{CaptureSession, SessionConfig, SessionStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Countdown before recording begins (default from config)
    pub countdown_secs: Option<u8>,

    /// Request the camera track (default from config)
    pub video: Option<bool>,

    /// Request the microphone track (default from config)
    pub audio: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
    pub recording_bytes: usize,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ReleaseSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/start
/// Create a capture session and begin its countdown
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    info!("Starting capture session: {}", session_id);

    // Check if this session already exists
    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Session {} already exists", session_id),
                }),
            )
                .into_response();
        }
    }

    let capture = &state.config.capture;
    let analyzer_cfg = &state.config.analyzer;

    let session_config = SessionConfig {
        session_id: session_id.clone(),
        countdown_secs: req.countdown_secs.unwrap_or(capture.countdown_secs),
        sampling_interval: Duration::from_millis(analyzer_cfg.interval_ms),
        jpeg_quality: capture.jpeg_quality,
        constraints: MediaConstraints {
            video: req.video.unwrap_or(capture.video),
            audio: req.audio.unwrap_or(capture.audio),
        },
        publish_behavior_metrics: capture.publish_behavior_metrics,
    };

    let backend_config = MediaBackendConfig {
        frame_width: capture.frame_width,
        frame_height: capture.frame_height,
        frame_interval_ms: capture.frame_interval_ms,
        chunk_interval_ms: capture.chunk_interval_ms,
    };

    let backend = match MediaBackendFactory::create(MediaDevice::Synthetic, backend_config) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to create media backend: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create media backend: {}", e),
                }),
            )
                .into_response();
        }
    };

    let analyzer = match RemoteAnalyzer::new(
        analyzer_cfg.endpoint.clone(),
        Duration::from_secs(analyzer_cfg.request_timeout_secs),
    ) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            error!("Failed to create analyzer client: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create analyzer client: {}", e),
                }),
            )
                .into_response();
        }
    };

    let session = Arc::new(CaptureSession::new(session_config, backend, analyzer).await);

    if let Some(err) = session.last_error() {
        error!("Session {} created with error: {}", session_id, err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: err }),
        )
            .into_response();
    }

    session.request_start();

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session);
    }

    info!("Capture session started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "counting_down".to_string(),
            message: format!("Countdown started for session {}", session_id),
        }),
    )
        .into_response()
}

/// POST /sessions/stop/:session_id
/// Stop an in-progress recording and finalize it
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping capture session: {}", session_id);

    let session = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response();
    };

    // A stop while not recording is an idempotent no-op
    match session.request_stop().await {
        Some(take) => (
            StatusCode::OK,
            Json(StopSessionResponse {
                session_id,
                status: "stopped".to_string(),
                message: "Recording stopped".to_string(),
                recording_bytes: take.recording_bytes,
                stats: take.stats,
            }),
        )
            .into_response(),
        None => (
            StatusCode::OK,
            Json(StopSessionResponse {
                session_id,
                status: "idle".to_string(),
                message: "No recording in progress".to_string(),
                recording_bytes: 0,
                stats: session.stats(),
            }),
        )
            .into_response(),
    }
}

/// POST /sessions/release/:session_id
/// Tear a session down and evict it: stops any in-progress recording,
/// stops every device track, removes the entry from the session map
pub async fn release_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response();
    };

    // Finalize an in-progress take so its blob still reaches the consumer
    let _ = session.request_stop().await;
    session.release();

    info!("Capture session released: {}", session_id);

    (
        StatusCode::OK,
        Json(ReleaseSessionResponse {
            session_id,
            status: "released".to_string(),
            message: "Session released; all tracks stopped".to_string(),
        }),
    )
        .into_response()
}

/// GET /sessions/:session_id/status
/// Get state and statistics for a session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => (StatusCode::OK, Json(session.stats())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /sessions/:session_id/metrics
/// Get the latest metrics snapshot for a session
pub async fn get_session_metrics(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => match session.latest_metrics() {
            Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("No metrics published yet for session {}", session_id),
                }),
            )
                .into_response(),
        },
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
