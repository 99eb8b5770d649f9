// Integration tests for the remote analyzer client, against a local
// stand-in for the emotion-analysis endpoint.

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use interview_capture::{AnalysisOutcome, FrameAnalyzer, RemoteAnalyzer, VideoFrame};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Spawn a fake analysis endpoint returning a fixed status and JSON body.
/// Returns the endpoint URL and the last request body it saw.
async fn spawn_endpoint(
    status: StatusCode,
    body: Value,
) -> Result<(String, Arc<Mutex<Option<Value>>>)> {
    let seen = Arc::new(Mutex::new(None));

    let app = Router::new().route(
        "/analyze",
        post({
            let seen = Arc::clone(&seen);
            move |Json(req): Json<Value>| {
                let seen = Arc::clone(&seen);
                let body = body.clone();
                async move {
                    *seen.lock().unwrap() = Some(req);
                    (status, Json(body))
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((format!("http://{}/analyze", addr), seen))
}

fn test_frame() -> VideoFrame {
    VideoFrame::solid(16, 16, [120, 80, 40], 0)
}

fn client(endpoint: &str) -> RemoteAnalyzer {
    RemoteAnalyzer::new(endpoint, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn well_formed_response_yields_mapped_metrics() -> Result<()> {
    let (endpoint, seen) = spawn_endpoint(
        StatusCode::OK,
        json!({
            "metrics": {"confident": 0.9, "stressed": 0.1, "nervous": 0.05, "engaged": 0.8},
            "face_tracking": {
                "blink_count": 5,
                "looking_at_camera": true,
                "head_pose": {"pitch": 1.0, "yaw": 2.0, "roll": 0.0}
            }
        }),
    )
    .await?;

    let image = test_frame().to_data_url(80)?;
    let outcome = client(&endpoint).analyze(&image).await;

    match outcome {
        AnalysisOutcome::Valid { facial, behavior } => {
            assert_eq!(facial.confident, 90.0);
            assert_eq!(facial.stressed, 10.0);
            assert!((facial.nervous - 5.0).abs() < 1e-4);
            assert_eq!(behavior.blink_count, 5);
            assert!(behavior.looking_at_camera);
            assert_eq!(behavior.head_pose.pitch, 1.0);
            assert_eq!(behavior.head_pose.yaw, 2.0);
            assert_eq!(behavior.head_pose.roll, 0.0);
        }
        AnalysisOutcome::Invalid => panic!("expected a valid outcome"),
    }

    // The request body carries the encoded frame under the `image` field
    let request = seen.lock().unwrap().clone().expect("endpoint saw a request");
    let image_field = request["image"].as_str().unwrap();
    assert!(image_field.starts_with("data:image/jpeg;base64,"));

    Ok(())
}

#[tokio::test]
async fn server_error_is_invalid() -> Result<()> {
    let (endpoint, _) =
        spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})).await?;

    let image = test_frame().to_data_url(80)?;
    assert_eq!(client(&endpoint).analyze(&image).await, AnalysisOutcome::Invalid);
    Ok(())
}

#[tokio::test]
async fn response_missing_required_fields_is_invalid() -> Result<()> {
    // 2xx but no face_tracking object
    let (endpoint, _) = spawn_endpoint(
        StatusCode::OK,
        json!({"metrics": {"confident": 0.9, "stressed": 0.1, "nervous": 0.05}}),
    )
    .await?;

    let image = test_frame().to_data_url(80)?;
    assert_eq!(client(&endpoint).analyze(&image).await, AnalysisOutcome::Invalid);
    Ok(())
}

#[tokio::test]
async fn non_json_response_is_invalid() -> Result<()> {
    let app = Router::new().route(
        "/analyze",
        post(|| async { (StatusCode::OK, "not json").into_response() }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let image = test_frame().to_data_url(80)?;
    let outcome = client(&format!("http://{}/analyze", addr))
        .analyze(&image)
        .await;
    assert_eq!(outcome, AnalysisOutcome::Invalid);
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_invalid() -> Result<()> {
    // Nothing listens on the discard port
    let image = test_frame().to_data_url(80)?;
    let outcome = client("http://127.0.0.1:9/analyze").analyze(&image).await;
    assert_eq!(outcome, AnalysisOutcome::Invalid);
    Ok(())
}

#[tokio::test]
async fn slow_endpoint_times_out_to_invalid() -> Result<()> {
    let app = Router::new().route(
        "/analyze",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({}))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let analyzer = RemoteAnalyzer::new(
        format!("http://{}/analyze", addr),
        Duration::from_millis(50),
    )?;
    let image = test_frame().to_data_url(80)?;
    assert_eq!(analyzer.analyze(&image).await, AnalysisOutcome::Invalid);
    Ok(())
}
