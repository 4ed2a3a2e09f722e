//! Fire and smoke persistence monitoring
//!
//! Hazards are judged per class rather than per identity: a class must be
//! seen above its confidence floor on every frame for the persistence window
//! before a single alert is raised. Any frame without the class closes the
//! window and re-arms the alert.

use guardian_common::{Detection, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Monitored hazard classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Fire,
    Smoke,
}

impl HazardKind {
    pub const ALL: [HazardKind; 2] = [HazardKind::Fire, HazardKind::Smoke];

    /// Map a detector label to a hazard class
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "fire" => Some(HazardKind::Fire),
            "smoke" => Some(HazardKind::Smoke),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardKind::Fire => "fire",
            HazardKind::Smoke => "smoke",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for HazardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hazard monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Minimum detection score that keeps a window open (default: 0.5)
    pub confidence_floor: f32,
    /// Continuous presence required before alerting, in seconds (default: 5.0)
    pub persistence_secs: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
            persistence_secs: 5.0,
        }
    }
}

/// Per-class dwell window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HazardState {
    pub active_since: Option<Timestamp>,
    pub notified: bool,
}

/// Peak confidence per class among one frame's qualifying detections
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HazardSightings {
    peaks: [Option<f32>; 2],
}

impl HazardSightings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the hazard detections of a frame that reach `floor`
    pub fn from_detections<'a, I>(detections: I, floor: f32) -> Self
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        let mut sightings = Self::new();
        for det in detections {
            if let Some(kind) = HazardKind::from_label(&det.label) {
                sightings.record(kind, det.score, floor);
            }
        }
        sightings
    }

    /// Keep `score` if it reaches `floor` and beats the current peak
    pub fn record(&mut self, kind: HazardKind, score: f32, floor: f32) {
        if score < floor {
            return;
        }
        let peak = &mut self.peaks[kind.slot()];
        if peak.map_or(true, |p| score > p) {
            *peak = Some(score);
        }
    }

    pub fn peak(&self, kind: HazardKind) -> Option<f32> {
        self.peaks[kind.slot()]
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.iter().all(Option::is_none)
    }
}

/// Raised once per uninterrupted window that outlasts the persistence threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardAlert {
    pub kind: HazardKind,
    /// Peak confidence in the alerting frame
    pub confidence: f32,
    pub elapsed: f64,
}

/// Per-stream hazard persistence state
#[derive(Debug, Clone, Default)]
pub struct HazardMonitor {
    config: HazardConfig,
    states: [HazardState; 2],
}

impl HazardMonitor {
    pub fn new(config: HazardConfig) -> Self {
        Self {
            config,
            states: [HazardState::default(); 2],
        }
    }

    pub fn config(&self) -> &HazardConfig {
        &self.config
    }

    pub fn state(&self, kind: HazardKind) -> &HazardState {
        &self.states[kind.slot()]
    }

    /// Advance every class by one frame
    pub fn evaluate(&mut self, sightings: &HazardSightings, now: Timestamp) -> Vec<HazardAlert> {
        let mut alerts = Vec::new();
        for kind in HazardKind::ALL {
            let state = &mut self.states[kind.slot()];
            let Some(confidence) = sightings.peak(kind) else {
                if state.active_since.is_some() {
                    info!("Hazard cleared: {}", kind);
                }
                *state = HazardState::default();
                continue;
            };

            let since = *state.active_since.get_or_insert_with(|| {
                info!("Hazard window opened: {} (score {:.2})", kind, confidence);
                now
            });
            let elapsed = now - since;
            if elapsed >= self.config.persistence_secs && !state.notified {
                warn!("Hazard persisted: {} for {:.1}s", kind, elapsed);
                state.notified = true;
                alerts.push(HazardAlert {
                    kind,
                    confidence,
                    elapsed,
                });
            }
        }
        alerts
    }

    /// Forget all open windows
    pub fn reset(&mut self) {
        self.states = [HazardState::default(); 2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_common::BoundingBox;

    fn fire(score: f32) -> HazardSightings {
        let mut s = HazardSightings::new();
        s.record(HazardKind::Fire, score, 0.5);
        s
    }

    #[test]
    fn test_labels() {
        assert_eq!(HazardKind::from_label("fire"), Some(HazardKind::Fire));
        assert_eq!(HazardKind::from_label("smoke"), Some(HazardKind::Smoke));
        assert_eq!(HazardKind::from_label("person"), None);
        assert_eq!(
            serde_json::to_string(&HazardKind::Smoke).unwrap(),
            "\"smoke\""
        );
    }

    #[test]
    fn test_sightings_keep_peak_above_floor() {
        let detections = vec![
            Detection::new(BoundingBox::default(), "fire", 0.55),
            Detection::new(BoundingBox::default(), "fire", 0.8),
            Detection::new(BoundingBox::default(), "smoke", 0.4),
            Detection::new(BoundingBox::default(), "person", 0.9),
        ];
        let s = HazardSightings::from_detections(&detections, 0.5);
        assert_eq!(s.peak(HazardKind::Fire), Some(0.8));
        assert_eq!(s.peak(HazardKind::Smoke), None);
    }

    #[test]
    fn test_floor_is_inclusive() {
        assert_eq!(fire(0.5).peak(HazardKind::Fire), Some(0.5));
        assert!(fire(0.49).is_empty());
    }

    #[test]
    fn test_alert_after_persistence() {
        let mut monitor = HazardMonitor::default();
        assert!(monitor.evaluate(&fire(0.7), 0.0).is_empty());
        assert!(monitor.evaluate(&fire(0.7), 4.9).is_empty());

        let alerts = monitor.evaluate(&fire(0.9), 5.0);
        assert_eq!(
            alerts,
            vec![HazardAlert {
                kind: HazardKind::Fire,
                confidence: 0.9,
                elapsed: 5.0
            }]
        );
        assert!(monitor.evaluate(&fire(0.9), 6.0).is_empty());
        assert!(monitor.state(HazardKind::Fire).notified);
    }

    #[test]
    fn test_classes_are_independent() {
        let mut monitor = HazardMonitor::default();
        let mut both = fire(0.7);
        both.record(HazardKind::Smoke, 0.6, 0.5);

        monitor.evaluate(&both, 0.0);
        monitor.evaluate(&fire(0.7), 1.0);
        assert_eq!(monitor.state(HazardKind::Smoke).active_since, None);
        assert_eq!(monitor.state(HazardKind::Fire).active_since, Some(0.0));
    }

    #[test]
    fn test_reset() {
        let mut monitor = HazardMonitor::default();
        monitor.evaluate(&fire(0.7), 0.0);
        monitor.reset();
        assert_eq!(*monitor.state(HazardKind::Fire), HazardState::default());
    }
}
