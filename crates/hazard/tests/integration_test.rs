//! Integration tests for hazard persistence

use guardian_common::{BoundingBox, Detection};
use guardian_hazard::{HazardConfig, HazardKind, HazardMonitor, HazardSightings};

fn frame_with(labels: &[(&str, f32)]) -> HazardSightings {
    let detections: Vec<Detection> = labels
        .iter()
        .map(|(label, score)| Detection::new(BoundingBox::new(0.0, 0.0, 50.0, 50.0), *label, *score))
        .collect();
    HazardSightings::from_detections(&detections, HazardConfig::default().confidence_floor)
}

#[test]
fn test_gap_restarts_window() {
    let mut monitor = HazardMonitor::default();
    let fire = frame_with(&[("fire", 0.8)]);
    let empty = frame_with(&[]);

    // Four frames of fire, one second apart
    for t in 0..4 {
        assert!(monitor.evaluate(&fire, t as f64).is_empty());
    }
    // One missed frame
    assert!(monitor.evaluate(&empty, 4.0).is_empty());
    assert_eq!(monitor.state(HazardKind::Fire).active_since, None);

    // Fire again: the window starts over at 5.0
    for t in 5..10 {
        assert!(
            monitor.evaluate(&fire, t as f64).is_empty(),
            "no alert before a fresh window elapses (t={t})"
        );
    }
    let alerts = monitor.evaluate(&fire, 10.0);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, HazardKind::Fire);
    assert_eq!(alerts[0].elapsed, 5.0);
}

#[test]
fn test_single_alert_per_window() {
    let mut monitor = HazardMonitor::default();
    let smoke = frame_with(&[("smoke", 0.6)]);

    let total: usize = (0..=40)
        .map(|i| monitor.evaluate(&smoke, i as f64 * 0.5).len())
        .sum();
    assert_eq!(total, 1);
}

#[test]
fn test_alert_rearms_after_clear() {
    let mut monitor = HazardMonitor::default();
    let fire = frame_with(&[("fire", 0.9)]);
    let empty = frame_with(&[]);

    monitor.evaluate(&fire, 0.0);
    assert_eq!(monitor.evaluate(&fire, 5.0).len(), 1);
    monitor.evaluate(&empty, 6.0);
    assert!(!monitor.state(HazardKind::Fire).notified);

    monitor.evaluate(&fire, 7.0);
    assert_eq!(monitor.evaluate(&fire, 12.0).len(), 1);
}

#[test]
fn test_low_confidence_counts_as_absent() {
    let mut monitor = HazardMonitor::default();
    monitor.evaluate(&frame_with(&[("fire", 0.9)]), 0.0);
    monitor.evaluate(&frame_with(&[("fire", 0.3)]), 1.0);
    assert_eq!(monitor.state(HazardKind::Fire).active_since, None);
}

#[test]
fn test_alert_reports_frame_peak() {
    let mut monitor = HazardMonitor::new(HazardConfig {
        confidence_floor: 0.5,
        persistence_secs: 2.0,
    });
    monitor.evaluate(&frame_with(&[("smoke", 0.6)]), 0.0);
    let alerts = monitor.evaluate(&frame_with(&[("smoke", 0.55), ("smoke", 0.95)]), 2.0);
    assert_eq!(alerts[0].confidence, 0.95);
}

#[test]
fn test_fire_and_smoke_alert_together() {
    let mut monitor = HazardMonitor::default();
    let both = frame_with(&[("fire", 0.7), ("smoke", 0.7), ("person", 0.99)]);
    monitor.evaluate(&both, 0.0);
    let alerts = monitor.evaluate(&both, 5.0);
    let kinds: Vec<HazardKind> = alerts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![HazardKind::Fire, HazardKind::Smoke]);
}
