use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Head orientation in degrees, as reported by face tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Facial-expression metrics on a percent scale (0-100 in practice,
/// not strictly clamped). Fully replaced on every sampling tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FacialMetrics {
    pub confident: f32,
    pub stressed: f32,
    pub nervous: f32,
}

/// Behavioral face-tracking metrics, replaced on every sampling tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub blink_count: u32,
    pub looking_at_camera: bool,
    pub head_pose: HeadPose,
}

/// Speech metrics populated elsewhere in the system; this component
/// only forwards the latest values it was handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationMetrics {
    pub filler_word_count: u32,
    pub words_per_minute: f32,
    pub clarity_score: f32,
}

/// Merged metrics delivered to the consumer once per sampling tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub facial: FacialMetrics,
    pub behavior: BehaviorMetrics,
    pub communication: CommunicationMetrics,

    /// When this snapshot was assembled
    pub captured_at: DateTime<Utc>,
}

/// Merges per-tick facial/behavior metrics with the externally-owned
/// communication metrics and delivers snapshots to at most one consumer.
///
/// Sampling ticks carry a monotonic sequence number; a resolution is
/// published only if it is still the latest dispatched tick, so a slow
/// in-flight analysis call can never overwrite a newer result.
pub struct MetricsPublisher {
    consumer: Mutex<Option<mpsc::UnboundedSender<MetricsSnapshot>>>,
    communication: Mutex<CommunicationMetrics>,
    latest: Mutex<Option<MetricsSnapshot>>,
    dispatched: AtomicU64,
    published: AtomicU64,
    publish_behavior: bool,
}

impl MetricsPublisher {
    /// Create a publisher. `publish_behavior` gates the extended
    /// face-tracking metrics; when disabled, snapshots carry zeroed
    /// behavior fields.
    pub fn new(publish_behavior: bool) -> Self {
        Self {
            consumer: Mutex::new(None),
            communication: Mutex::new(CommunicationMetrics::default()),
            latest: Mutex::new(None),
            dispatched: AtomicU64::new(0),
            published: AtomicU64::new(0),
            publish_behavior,
        }
    }

    /// Register the consumer. Replaces any previously registered one.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<MetricsSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.consumer.lock().unwrap() = Some(tx);
        rx
    }

    /// Replace the forwarded communication metrics
    pub fn set_communication(&self, metrics: CommunicationMetrics) {
        *self.communication.lock().unwrap() = metrics;
    }

    /// Reserve a sequence number for a freshly dispatched sampling tick
    pub fn next_sequence(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish one tick's results. Returns false if the tick was
    /// superseded by a later dispatch and its results were discarded.
    pub fn publish(&self, sequence: u64, facial: FacialMetrics, behavior: BehaviorMetrics) -> bool {
        if sequence != self.dispatched.load(Ordering::SeqCst) {
            debug!(sequence, "discarding superseded metrics resolution");
            return false;
        }

        let behavior = if self.publish_behavior {
            behavior
        } else {
            BehaviorMetrics::default()
        };

        let snapshot = MetricsSnapshot {
            facial,
            behavior,
            communication: *self.communication.lock().unwrap(),
            captured_at: Utc::now(),
        };

        *self.latest.lock().unwrap() = Some(snapshot.clone());
        self.published.fetch_add(1, Ordering::SeqCst);

        if let Some(tx) = self.consumer.lock().unwrap().as_ref() {
            // A dropped receiver is not an error; the consumer simply went away
            let _ = tx.send(snapshot);
        }

        true
    }

    /// Most recent snapshot, if any tick has published yet
    pub fn latest(&self) -> Option<MetricsSnapshot> {
        self.latest.lock().unwrap().clone()
    }

    /// Number of snapshots delivered so far
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facial(confident: f32) -> FacialMetrics {
        FacialMetrics {
            confident,
            stressed: 10.0,
            nervous: 5.0,
        }
    }

    #[test]
    fn publishes_merged_snapshot_to_consumer() {
        let publisher = MetricsPublisher::new(true);
        let mut rx = publisher.subscribe();

        publisher.set_communication(CommunicationMetrics {
            filler_word_count: 4,
            words_per_minute: 120.0,
            clarity_score: 0.9,
        });

        let seq = publisher.next_sequence();
        assert!(publisher.publish(seq, facial(90.0), BehaviorMetrics::default()));

        let snapshot = rx.try_recv().expect("snapshot should be delivered");
        assert_eq!(snapshot.facial.confident, 90.0);
        assert_eq!(snapshot.communication.filler_word_count, 4);
        assert_eq!(publisher.published_count(), 1);
    }

    #[test]
    fn superseded_resolution_is_discarded() {
        let publisher = MetricsPublisher::new(true);
        let mut rx = publisher.subscribe();

        let stale = publisher.next_sequence();
        let latest = publisher.next_sequence();

        assert!(!publisher.publish(stale, facial(1.0), BehaviorMetrics::default()));
        assert!(publisher.publish(latest, facial(2.0), BehaviorMetrics::default()));

        let snapshot = rx.try_recv().unwrap();
        assert_eq!(snapshot.facial.confident, 2.0);
        assert!(rx.try_recv().is_err(), "stale tick must not publish");
    }

    #[test]
    fn behavior_metrics_zeroed_when_capability_disabled() {
        let publisher = MetricsPublisher::new(false);

        let seq = publisher.next_sequence();
        let behavior = BehaviorMetrics {
            blink_count: 12,
            looking_at_camera: true,
            head_pose: HeadPose::default(),
        };
        publisher.publish(seq, facial(50.0), behavior);

        let latest = publisher.latest().unwrap();
        assert_eq!(latest.behavior, BehaviorMetrics::default());
    }

    #[test]
    fn publish_without_consumer_still_updates_latest() {
        let publisher = MetricsPublisher::new(true);
        let seq = publisher.next_sequence();
        assert!(publisher.publish(seq, facial(70.0), BehaviorMetrics::default()));
        assert_eq!(publisher.latest().unwrap().facial.confident, 70.0);
    }
}
