use serde::{Deserialize, Serialize};

/// Lifecycle of a recording session.
///
/// `Idle → CountingDown(n) → ... → CountingDown(1) → Recording → Stopped`,
/// with `Stopped` collapsing back to `Idle` once the take is finalized.
/// Transitions are timer-driven (one countdown tick per second), never
/// callback-chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "seconds_left", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    CountingDown(u8),
    Recording,
    Stopped,
}

impl SessionState {
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_phase_tag() {
        let json = serde_json::to_value(SessionState::Recording).unwrap();
        assert_eq!(json["phase"], "recording");

        let json = serde_json::to_value(SessionState::CountingDown(2)).unwrap();
        assert_eq!(json["phase"], "counting_down");
        assert_eq!(json["seconds_left"], 2);
    }

    #[test]
    fn only_recording_reports_recording() {
        assert!(SessionState::Recording.is_recording());
        assert!(!SessionState::Idle.is_recording());
        assert!(!SessionState::CountingDown(3).is_recording());
        assert!(!SessionState::Stopped.is_recording());
    }
}
