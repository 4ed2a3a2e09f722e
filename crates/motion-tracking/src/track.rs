use std::collections::VecDeque;

use guardian_common::{BoundingBox, KeypointSet, Timestamp, TrackId, WhitelistVerdict};

/// A person candidate followed across frames.
///
/// The whitelist decision is taken once at creation. The two notification
/// latches only ever move from `false` to `true`.
#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    start_time: Timestamp,
    last_seen: Timestamp,
    bbox: BoundingBox,
    whitelisted: bool,
    whitelist_name: Option<String>,
    loiter_notified: bool,
    abnormal_notified: bool,
    keypoint_history: VecDeque<KeypointSet>,
    history_limit: usize,
    last_keypoints: Option<KeypointSet>,
}

impl Track {
    pub(crate) fn new(
        id: TrackId,
        bbox: BoundingBox,
        now: Timestamp,
        verdict: WhitelistVerdict,
        history_limit: usize,
    ) -> Self {
        let history_limit = history_limit.min(crate::MAX_KEYPOINT_HISTORY);
        Self {
            id,
            start_time: now,
            last_seen: now,
            bbox,
            whitelisted: verdict.is_member,
            whitelist_name: verdict.name.filter(|_| verdict.is_member),
            loiter_notified: false,
            abnormal_notified: false,
            keypoint_history: VecDeque::with_capacity(history_limit),
            history_limit,
            last_keypoints: None,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn last_seen(&self) -> Timestamp {
        self.last_seen
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted
    }

    pub fn whitelist_name(&self) -> Option<&str> {
        self.whitelist_name.as_deref()
    }

    /// Time since the track was created
    pub fn dwell(&self, now: Timestamp) -> f64 {
        now - self.start_time
    }

    /// Time since the last matching detection
    pub fn idle(&self, now: Timestamp) -> f64 {
        now - self.last_seen
    }

    /// Dwell between creation and the last matching detection
    pub fn observed_dwell(&self) -> f64 {
        self.last_seen - self.start_time
    }

    pub(crate) fn refresh(&mut self, bbox: BoundingBox, now: Timestamp) {
        self.bbox = bbox;
        self.last_seen = now;
    }

    pub fn loiter_notified(&self) -> bool {
        self.loiter_notified
    }

    pub fn abnormal_notified(&self) -> bool {
        self.abnormal_notified
    }

    /// Latch the loitering notification. Returns `true` only on the first call.
    pub fn latch_loiter_notified(&mut self) -> bool {
        !std::mem::replace(&mut self.loiter_notified, true)
    }

    /// Latch the abnormal-behavior notification. Returns `true` only on the first call.
    pub fn latch_abnormal_notified(&mut self) -> bool {
        !std::mem::replace(&mut self.abnormal_notified, true)
    }

    /// Prior keypoint sets, oldest first
    pub fn keypoint_history(&self) -> impl DoubleEndedIterator<Item = &KeypointSet> + '_ {
        self.keypoint_history.iter()
    }

    pub fn keypoint_history_len(&self) -> usize {
        self.keypoint_history.len()
    }

    pub fn last_keypoints(&self) -> Option<&KeypointSet> {
        self.last_keypoints.as_ref()
    }

    /// Append freshly extracted keypoints, dropping the oldest entry on overflow,
    /// and cache them for frames where extraction is skipped.
    pub fn record_keypoints(&mut self, keypoints: KeypointSet) {
        if self.history_limit == 0 {
            self.last_keypoints = Some(keypoints);
            return;
        }
        while self.keypoint_history.len() >= self.history_limit {
            self.keypoint_history.pop_front();
        }
        self.keypoint_history.push_back(keypoints.clone());
        self.last_keypoints = Some(keypoints);
    }
}
