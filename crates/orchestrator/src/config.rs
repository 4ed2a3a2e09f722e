//! Engine configuration loaded from YAML

use std::path::Path;

use guardian_hazard::HazardConfig;
use guardian_loitering::LoiteringConfig;
use guardian_motion_tracking::TrackingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per-frame detection handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Detector label treated as a person (default: "person")
    pub person_label: String,
    /// Minimum score for a person detection to be tracked (default: 0.6)
    pub person_score_floor: f32,
    /// Side of the square detector input the boxes refer to (default: 320)
    pub model_input_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            person_label: "person".to_string(),
            person_score_floor: 0.6,
            model_input_size: 320,
        }
    }
}

/// Alert dispatch queue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Alerts buffered before new ones are dropped (default: 64)
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// Stream session behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frames between throughput log lines (default: 30)
    pub stats_interval: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { stats_interval: 30 }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub tracking: TrackingConfig,
    pub loitering: LoiteringConfig,
    pub hazard: HazardConfig,
    pub frame: FrameConfig,
    pub dispatch: DispatchConfig,
    pub session: SessionConfig,
}

impl GuardianConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: GuardianConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !(self.loitering.dwell_threshold_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "loitering.dwell_threshold_secs must be non-negative, got {}",
                self.loitering.dwell_threshold_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.hazard.confidence_floor) {
            return Err(ConfigError::Invalid(format!(
                "hazard.confidence_floor must be in [0, 1], got {}",
                self.hazard.confidence_floor
            )));
        }
        if !(self.hazard.persistence_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "hazard.persistence_secs must be non-negative, got {}",
                self.hazard.persistence_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.frame.person_score_floor) {
            return Err(ConfigError::Invalid(format!(
                "frame.person_score_floor must be in [0, 1], got {}",
                self.frame.person_score_floor
            )));
        }
        if self.frame.model_input_size == 0 {
            return Err(ConfigError::Invalid(
                "frame.model_input_size must be positive".to_string(),
            ));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.session.stats_interval == 0 {
            return Err(ConfigError::Invalid(
                "session.stats_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardianConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracking.match_threshold, 0.25);
        assert_eq!(config.tracking.timeout_secs, 5.0);
        assert_eq!(config.loitering.dwell_threshold_secs, 5.0);
        assert_eq!(config.loitering.pose.interval, 2);
        assert_eq!(config.loitering.behavior.min_landmarks, 25);
        assert_eq!(config.hazard.confidence_floor, 0.5);
        assert_eq!(config.frame.person_score_floor, 0.6);
        assert_eq!(config.frame.model_input_size, 320);
        assert_eq!(config.dispatch.queue_capacity, 64);
        assert_eq!(config.session.stats_interval, 30);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
loitering:
  dwell_threshold_secs: 8.0
  pose:
    interval: 5
hazard:
  persistence_secs: 3.0
";
        let config = GuardianConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.loitering.dwell_threshold_secs, 8.0);
        assert_eq!(config.loitering.pose.interval, 5);
        assert!(config.loitering.pose.enabled);
        assert_eq!(config.hazard.persistence_secs, 3.0);
        assert_eq!(config.hazard.confidence_floor, 0.5);
        assert_eq!(config.frame.person_label, "person");
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = GuardianConfig::default().to_yaml().unwrap();
        let parsed = GuardianConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.tracking, TrackingConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GuardianConfig::from_yaml_str("hazard:\n  confidence_floor: 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GuardianConfig::from_yaml_str("tracking:\n  iou_weight: -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GuardianConfig::from_yaml_str("dispatch:\n  queue_capacity: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = GuardianConfig::from_yaml_str("tracking: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
