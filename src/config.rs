//! Engine configuration
//!
//! Tuning knobs for pattern tracking, prediction, adaptation, and model
//! accuracy smoothing. Defaults match the reference behavior of the learning
//! core; hosts can override them from a TOML file.

use crate::error::{MetisError, Result};
use crate::types::TruthValue;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine tuning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of ranked predictions returned per query
    #[serde(default = "default_max_predictions")]
    pub max_predictions: usize,

    /// Minimum context similarity for a pattern to participate in prediction
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Confidence assigned to a newly discovered behavior pattern
    #[serde(default = "default_initial_pattern_confidence")]
    pub initial_pattern_confidence: f32,

    /// Confidence increase per repeat observation, capped at 1.0
    #[serde(default = "default_pattern_confidence_step")]
    pub pattern_confidence_step: f32,

    /// Effectiveness assigned to a newly created adaptation strategy
    #[serde(default = "default_initial_effectiveness")]
    pub initial_effectiveness: f32,

    /// Effectiveness delta per adaptation or feedback event, clamped to [0, 1]
    #[serde(default = "default_effectiveness_step")]
    pub effectiveness_step: f32,

    /// Accuracy reported when no feedback-bearing training data exists
    #[serde(default = "default_neutral_accuracy")]
    pub neutral_accuracy: f32,

    /// EMA weight of the newest score when updating user model accuracy
    #[serde(default = "default_accuracy_smoothing")]
    pub accuracy_smoothing: f32,

    /// Truth value stamped on "learning occurred" atoms
    #[serde(default = "default_record_truth")]
    pub record_truth: TruthValue,
}

fn default_max_predictions() -> usize {
    5
}

fn default_similarity_threshold() -> f32 {
    0.5
}

fn default_initial_pattern_confidence() -> f32 {
    0.5
}

fn default_pattern_confidence_step() -> f32 {
    0.01
}

fn default_initial_effectiveness() -> f32 {
    0.5
}

fn default_effectiveness_step() -> f32 {
    0.1
}

fn default_neutral_accuracy() -> f32 {
    0.5
}

fn default_accuracy_smoothing() -> f32 {
    0.1
}

fn default_record_truth() -> TruthValue {
    TruthValue::new(0.8, 0.6)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_predictions: default_max_predictions(),
            similarity_threshold: default_similarity_threshold(),
            initial_pattern_confidence: default_initial_pattern_confidence(),
            pattern_confidence_step: default_pattern_confidence_step(),
            initial_effectiveness: default_initial_effectiveness(),
            effectiveness_step: default_effectiveness_step(),
            neutral_accuracy: default_neutral_accuracy(),
            accuracy_smoothing: default_accuracy_smoothing(),
            record_truth: default_record_truth(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing keys
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;

        let cfg: EngineConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(toml_str)
            .map_err(|e| MetisError::Config(config::ConfigError::Message(e.to_string())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_predictions == 0 {
            return Err(MetisError::Config(config::ConfigError::Message(
                "max_predictions must be at least 1".to_string(),
            )));
        }

        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            (
                "initial_pattern_confidence",
                self.initial_pattern_confidence,
            ),
            ("pattern_confidence_step", self.pattern_confidence_step),
            ("initial_effectiveness", self.initial_effectiveness),
            ("effectiveness_step", self.effectiveness_step),
            ("neutral_accuracy", self.neutral_accuracy),
            ("accuracy_smoothing", self.accuracy_smoothing),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MetisError::Config(config::ConfigError::Message(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                ))));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_predictions, 5);
        assert_eq!(cfg.similarity_threshold, 0.5);
        assert_eq!(cfg.initial_pattern_confidence, 0.5);
        assert_eq!(cfg.pattern_confidence_step, 0.01);
        assert_eq!(cfg.initial_effectiveness, 0.5);
        assert_eq!(cfg.effectiveness_step, 0.1);
        assert_eq!(cfg.neutral_accuracy, 0.5);
        assert_eq!(cfg.accuracy_smoothing, 0.1);
        assert_eq!(cfg.record_truth.strength, 0.8);
        assert_eq!(cfg.record_truth.confidence, 0.6);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_from_file_partial_override() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "max_predictions = 3").unwrap();
        writeln!(file, "similarity_threshold = 0.6").unwrap();

        let cfg = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.max_predictions, 3);
        assert_eq!(cfg.similarity_threshold, 0.6);
        // Untouched keys keep their defaults
        assert_eq!(cfg.effectiveness_step, 0.1);
    }

    #[test]
    fn test_from_toml_string() {
        let cfg = EngineConfig::from_toml("accuracy_smoothing = 0.2").unwrap();
        assert_eq!(cfg.accuracy_smoothing, 0.2);
        assert_eq!(cfg.max_predictions, 5);

        assert!(EngineConfig::from_toml("max_predictions = \"lots\"").is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cfg = EngineConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig {
            max_predictions: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
