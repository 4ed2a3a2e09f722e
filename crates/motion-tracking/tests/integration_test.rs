//! Integration tests for the track registry

use guardian_common::{BoundingBox, KeypointSet, Landmark, WhitelistVerdict};
use guardian_motion_tracking::{TrackRegistry, TrackingConfig};

fn person_box(x: f32, y: f32) -> BoundingBox {
    BoundingBox::from_xywh(x, y, 50.0, 120.0)
}

/// Match-or-create followed by create/update, the way the frame orchestrator drives it
fn observe(registry: &mut TrackRegistry, bbox: BoundingBox, now: f64) -> u64 {
    let id = registry.match_or_create(&bbox);
    if registry.contains(id) {
        registry.update(id, bbox, now).unwrap();
    } else {
        registry.create(id, bbox, now, WhitelistVerdict::stranger());
    }
    id
}

#[test]
fn test_registry_creation() {
    let registry = TrackRegistry::new(TrackingConfig::default());
    assert!(registry.is_empty());
    assert_eq!(registry.iter().count(), 0);
}

#[test]
fn test_empty_registry_always_creates() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let mut seen = Vec::new();
    for _ in 0..5 {
        let id = registry.match_or_create(&person_box(10.0, 10.0));
        assert!(!seen.contains(&id));
        seen.push(id);
    }
}

#[test]
fn test_sequential_identical_detections_share_track() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let first = observe(&mut registry, person_box(100.0, 50.0), 0.0);
    let second = observe(&mut registry, person_box(100.0, 50.0), 0.1);
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_walking_person_keeps_identity() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let id = observe(&mut registry, person_box(0.0, 50.0), 0.0);

    for step in 1..20 {
        let x = step as f32 * 8.0;
        let now = step as f64 * 0.1;
        assert_eq!(observe(&mut registry, person_box(x, 50.0), now), id);
    }

    let track = registry.get(id).unwrap();
    assert_eq!(track.bbox().x1, 152.0);
    assert!((track.last_seen() - 1.9).abs() < 1e-9);
}

#[test]
fn test_two_people_get_distinct_tracks() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let a = observe(&mut registry, person_box(0.0, 0.0), 0.0);
    let b = observe(&mut registry, person_box(250.0, 0.0), 0.0);
    assert_ne!(a, b);

    for i in 1..10 {
        let now = i as f64 * 0.1;
        assert_eq!(observe(&mut registry, person_box(2.0, 0.0), now), a);
        assert_eq!(observe(&mut registry, person_box(248.0, 0.0), now), b);
    }
}

#[test]
fn test_expiry_after_timeout() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let id = observe(&mut registry, person_box(0.0, 0.0), 0.0);

    assert!(registry.expire(4.9, 5.0).is_empty());
    assert!(registry.contains(id));

    let removed = registry.expire(5.01, 5.0);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, id);
    assert!(!registry.contains(id));
}

#[test]
fn test_refreshed_track_survives() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let id = observe(&mut registry, person_box(0.0, 0.0), 0.0);
    observe(&mut registry, person_box(0.0, 0.0), 4.0);

    assert!(registry.expire_idle(8.9).is_empty());
    let removed = registry.expire_idle(9.5);
    assert_eq!(removed[0].id, id);
    assert!((removed[0].dwell_secs - 4.0).abs() < 1e-9);
}

#[test]
fn test_ids_never_reused_after_expiry() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let first = observe(&mut registry, person_box(0.0, 0.0), 0.0);
    registry.expire(10.0, 5.0);
    let second = observe(&mut registry, person_box(0.0, 0.0), 10.0);
    assert!(second > first);
}

#[test]
fn test_keypoint_history_capped() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let id = observe(&mut registry, person_box(0.0, 0.0), 0.0);
    let track = registry.get_mut(id).unwrap();

    for i in 0..50 {
        track.record_keypoints(KeypointSet::new(vec![Landmark::new(i as f32, 0.0, 1.0); 33]));
        assert!(track.keypoint_history_len() <= 10);
    }
    assert_eq!(track.keypoint_history_len(), 10);
}

#[test]
fn test_whitelist_verdict_is_fixed() {
    let mut registry = TrackRegistry::new(TrackingConfig::default());
    let bbox = person_box(0.0, 0.0);
    let id = registry.match_or_create(&bbox);
    registry.create(id, bbox, 0.0, WhitelistVerdict::member("dad"));

    // Re-creating a live id only refreshes it
    registry.create(id, bbox, 1.0, WhitelistVerdict::stranger());
    let track = registry.get(id).unwrap();
    assert!(track.is_whitelisted());
    assert_eq!(track.whitelist_name(), Some("dad"));
    assert_eq!(track.last_seen(), 1.0);
}
