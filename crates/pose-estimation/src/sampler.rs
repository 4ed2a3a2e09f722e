use serde::{Deserialize, Serialize};
use tracing::info;

/// Bounds applied to the sampling interval
pub const MIN_FRAME_INTERVAL: u32 = 1;
pub const MAX_FRAME_INTERVAL: u32 = 30;

/// Pose sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSamplingConfig {
    /// Run pose extraction at all (default: true)
    pub enabled: bool,
    /// Extract on every Nth sampling query (default: 2)
    pub interval: u32,
}

impl Default for PoseSamplingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 2,
        }
    }
}

/// Current sampler settings as reported to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseSettings {
    pub enabled: bool,
    pub frame_interval: u32,
}

/// Decides which loitering candidates get a fresh pose extraction.
///
/// A single counter is shared by every track of a stream, so the interval
/// bounds the total number of pose model calls rather than calls per person.
#[derive(Debug, Clone)]
pub struct PoseSampler {
    enabled: bool,
    interval: u32,
    counter: u32,
}

impl PoseSampler {
    pub fn new(config: &PoseSamplingConfig) -> Self {
        Self {
            enabled: config.enabled,
            interval: config.interval.clamp(MIN_FRAME_INTERVAL, MAX_FRAME_INTERVAL),
            counter: 0,
        }
    }

    /// Count one query; true when this one should run the pose model
    pub fn should_sample(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!(
            "Pose extraction {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Change the interval, clamped to 1..=30. Returns the value applied.
    pub fn set_interval(&mut self, interval: u32) -> u32 {
        self.interval = interval.clamp(MIN_FRAME_INTERVAL, MAX_FRAME_INTERVAL);
        info!("Pose extraction interval: every {} frames", self.interval);
        self.interval
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn settings(&self) -> PoseSettings {
        PoseSettings {
            enabled: self.enabled,
            frame_interval: self.interval,
        }
    }
}

impl Default for PoseSampler {
    fn default() -> Self {
        Self::new(&PoseSamplingConfig::default())
    }
}
