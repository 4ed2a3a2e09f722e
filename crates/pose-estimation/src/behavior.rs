use guardian_common::{KeypointSet, Landmark};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmarks::PoseLandmark;

/// Behavior tags derived from a person's pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Behavior {
    /// Head and ankles at nearly the same height
    Fall,
    /// A wrist raised well above its shoulder
    HandsUp,
    /// Wrists/ankles moving faster than the velocity threshold
    FastMotion,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Fall => "FALL",
            Behavior::HandsUp => "HANDS_UP",
            Behavior::FastMotion => "FAST_MOTION",
        }
    }
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds of the behavior rules, in model-input pixel units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Minimum landmarks a set must carry to be analyzed (default: 25)
    pub min_landmarks: usize,
    /// Head-to-ankle separation below which a pose counts as fallen (default: 50.0)
    pub fall_height: f32,
    /// How far a wrist must rise above its shoulder (default: 30.0)
    pub hands_up_margin: f32,
    /// Visibility a landmark needs to be trusted (default: 0.3)
    pub visibility_threshold: f32,
    /// Mean per-frame displacement that counts as fast motion (default: 50.0)
    pub fast_motion_threshold: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            min_landmarks: 25,
            fall_height: 50.0,
            hands_up_margin: 30.0,
            visibility_threshold: 0.3,
            fast_motion_threshold: 50.0,
        }
    }
}

/// Landmarks whose displacement is measured for fast motion
const MOTION_LANDMARKS: [PoseLandmark; 4] = [
    PoseLandmark::LeftWrist,
    PoseLandmark::RightWrist,
    PoseLandmark::LeftAnkle,
    PoseLandmark::RightAnkle,
];

/// Rule-based classifier over a keypoint set and the sets seen before it
#[derive(Debug, Clone, Default)]
pub struct BehaviorAnalyzer {
    config: BehaviorConfig,
}

impl BehaviorAnalyzer {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Tag the behaviors visible in `current`.
    ///
    /// `history` holds the sets observed before `current`, oldest first; only
    /// the most recent one is used, as the previous frame for fast motion.
    /// Returns an empty list when nothing was detected or the set is too sparse.
    pub fn analyze<'a, I>(&self, current: &KeypointSet, history: I) -> Vec<Behavior>
    where
        I: IntoIterator<Item = &'a KeypointSet>,
    {
        if current.len() < self.config.min_landmarks {
            return Vec::new();
        }

        let mut behaviors = Vec::new();
        if self.is_fallen(current) {
            behaviors.push(Behavior::Fall);
        }
        if self.has_hands_up(current) {
            behaviors.push(Behavior::HandsUp);
        }
        if let Some(previous) = history.into_iter().last() {
            if self.is_moving_fast(current, previous) {
                behaviors.push(Behavior::FastMotion);
            }
        }

        if !behaviors.is_empty() {
            debug!("Behaviors detected: {:?}", behaviors);
        }
        behaviors
    }

    fn is_fallen(&self, kp: &KeypointSet) -> bool {
        let (Some(head), Some(left), Some(right)) = (
            landmark(kp, PoseLandmark::Nose),
            landmark(kp, PoseLandmark::LeftAnkle),
            landmark(kp, PoseLandmark::RightAnkle),
        ) else {
            return false;
        };
        let ankle_y = (left.y + right.y) / 2.0;
        ankle_y - head.y < self.config.fall_height
    }

    fn has_hands_up(&self, kp: &KeypointSet) -> bool {
        let (Some(lw), Some(rw), Some(ls), Some(rs)) = (
            landmark(kp, PoseLandmark::LeftWrist),
            landmark(kp, PoseLandmark::RightWrist),
            landmark(kp, PoseLandmark::LeftShoulder),
            landmark(kp, PoseLandmark::RightShoulder),
        ) else {
            return false;
        };
        let margin = self.config.hands_up_margin;
        let raised = lw.y < ls.y - margin || rw.y < rs.y - margin;
        let visible = lw.visibility > self.config.visibility_threshold
            || rw.visibility > self.config.visibility_threshold;
        raised && visible
    }

    fn is_moving_fast(&self, current: &KeypointSet, previous: &KeypointSet) -> bool {
        if previous.len() < self.config.min_landmarks {
            return false;
        }
        let threshold = self.config.visibility_threshold;
        let displacements: Vec<f32> = MOTION_LANDMARKS
            .iter()
            .filter_map(|&l| Some((landmark(current, l)?, landmark(previous, l)?)))
            .filter(|(cur, prev)| cur.visibility > threshold && prev.visibility > threshold)
            .map(|(cur, prev)| cur.distance(prev))
            .collect();

        if displacements.is_empty() {
            return false;
        }
        let mean = displacements.iter().sum::<f32>() / displacements.len() as f32;
        mean > self.config.fast_motion_threshold
    }
}

fn landmark(kp: &KeypointSet, which: PoseLandmark) -> Option<&Landmark> {
    kp.get(which.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::POSE_LANDMARK_COUNT;

    /// Upright person: head at y=100, shoulders 150, wrists 250, ankles 400
    fn standing() -> Vec<Landmark> {
        let mut lm = vec![Landmark::new(160.0, 200.0, 0.9); POSE_LANDMARK_COUNT];
        lm[PoseLandmark::Nose.index()] = Landmark::new(160.0, 100.0, 0.9);
        lm[PoseLandmark::LeftShoulder.index()] = Landmark::new(140.0, 150.0, 0.9);
        lm[PoseLandmark::RightShoulder.index()] = Landmark::new(180.0, 150.0, 0.9);
        lm[PoseLandmark::LeftWrist.index()] = Landmark::new(130.0, 250.0, 0.9);
        lm[PoseLandmark::RightWrist.index()] = Landmark::new(190.0, 250.0, 0.9);
        lm[PoseLandmark::LeftAnkle.index()] = Landmark::new(150.0, 400.0, 0.9);
        lm[PoseLandmark::RightAnkle.index()] = Landmark::new(170.0, 400.0, 0.9);
        lm
    }

    fn set(lm: Vec<Landmark>) -> KeypointSet {
        KeypointSet::new(lm)
    }

    fn analyze(current: &KeypointSet, history: &[KeypointSet]) -> Vec<Behavior> {
        BehaviorAnalyzer::default().analyze(current, history)
    }

    #[test]
    fn test_standing_is_normal() {
        assert!(analyze(&set(standing()), &[]).is_empty());
    }

    #[test]
    fn test_fall_detected_when_head_near_ankles() {
        let mut lm = standing();
        lm[PoseLandmark::LeftAnkle.index()].y = 120.0;
        lm[PoseLandmark::RightAnkle.index()].y = 120.0;
        assert_eq!(analyze(&set(lm), &[]), vec![Behavior::Fall]);
    }

    #[test]
    fn test_no_fall_with_large_separation() {
        let lm = standing();
        assert_eq!(lm[PoseLandmark::Nose.index()].y, 100.0);
        assert!(!analyze(&set(lm), &[]).contains(&Behavior::Fall));
    }

    #[test]
    fn test_hands_up() {
        let mut lm = standing();
        lm[PoseLandmark::RightWrist.index()].y = 100.0;
        assert_eq!(analyze(&set(lm), &[]), vec![Behavior::HandsUp]);
    }

    #[test]
    fn test_hands_up_needs_margin() {
        let mut lm = standing();
        // 20 px above the shoulder is within the margin
        lm[PoseLandmark::LeftWrist.index()].y = 130.0;
        assert!(analyze(&set(lm), &[]).is_empty());
    }

    #[test]
    fn test_hands_up_ignored_when_wrists_invisible() {
        let mut lm = standing();
        lm[PoseLandmark::LeftWrist.index()] = Landmark::new(130.0, 50.0, 0.2);
        lm[PoseLandmark::RightWrist.index()] = Landmark::new(190.0, 250.0, 0.1);
        assert!(analyze(&set(lm), &[]).is_empty());
    }

    #[test]
    fn test_fast_motion_against_previous_set() {
        let previous = set(standing());
        let mut lm = standing();
        for l in MOTION_LANDMARKS {
            lm[l.index()].x += 80.0;
        }
        let current = set(lm);

        assert_eq!(
            analyze(&current, std::slice::from_ref(&previous)),
            vec![Behavior::FastMotion]
        );
        // Without a prior set there is nothing to compare with
        assert!(analyze(&current, &[]).is_empty());
    }

    #[test]
    fn test_fast_motion_uses_most_recent_set() {
        let mut moved = standing();
        for l in MOTION_LANDMARKS {
            moved[l.index()].x += 80.0;
        }
        let current = set(moved.clone());
        // Older entry far away, newest identical: no fast motion
        let history = vec![set(standing()), set(moved)];
        assert!(analyze(&current, &history).is_empty());
    }

    #[test]
    fn test_fast_motion_skips_low_visibility_pairs() {
        let previous = set(standing());
        let mut lm = standing();
        for l in MOTION_LANDMARKS {
            lm[l.index()].x += 80.0;
            lm[l.index()].visibility = 0.1;
        }
        assert!(analyze(&set(lm), &[previous]).is_empty());
    }

    #[test]
    fn test_slow_motion_is_normal() {
        let previous = set(standing());
        let mut lm = standing();
        for l in MOTION_LANDMARKS {
            lm[l.index()].x += 10.0;
        }
        assert!(analyze(&set(lm), &[previous]).is_empty());
    }

    #[test]
    fn test_sparse_set_yields_nothing() {
        let mut lm = standing();
        lm[PoseLandmark::LeftAnkle.index()].y = 100.0;
        lm.truncate(24);
        assert!(analyze(&set(lm), &[]).is_empty());
    }

    #[test]
    fn test_missing_ankles_skip_fall_only() {
        let mut lm = standing();
        lm[PoseLandmark::RightWrist.index()].y = 50.0;
        lm.truncate(25);
        assert_eq!(analyze(&set(lm), &[]), vec![Behavior::HandsUp]);
    }

    #[test]
    fn test_behavior_wire_names() {
        let json = serde_json::to_string(&vec![Behavior::Fall, Behavior::FastMotion]).unwrap();
        assert_eq!(json, r#"["FALL","FAST_MOTION"]"#);
        assert_eq!(Behavior::HandsUp.to_string(), "HANDS_UP");
    }
}
