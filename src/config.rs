//! Cascade configuration, loadable from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CascadeError, Result};

/// Primary detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Square input resolution fed to the detector.
    pub input_size: u32,
    pub confidence_threshold: f32,
    /// Output index of the per-slot score array.
    pub scores_output: usize,
    /// Output index of the `[ymin, xmin, ymax, xmax]` box array.
    pub boxes_output: usize,
    /// Output index of the valid-detection count.
    pub count_output: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: 416,
            confidence_threshold: 0.4,
            scores_output: 0,
            boxes_output: 1,
            count_output: 2,
        }
    }
}

/// Non-maximum suppression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NmsConfig {
    pub iou_threshold: f32,
}

impl Default for NmsConfig {
    fn default() -> Self {
        Self { iou_threshold: 0.5 }
    }
}

/// Secondary classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Square input resolution fed to the classifier.
    pub input_size: u32,
    /// Candidates are accepted when the classifier score is strictly above this.
    pub accept_threshold: f32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            input_size: 192,
            accept_threshold: 0.85,
        }
    }
}

/// Full cascade configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CascadeConfig {
    pub detector: DetectorConfig,
    pub nms: NmsConfig,
    pub verifier: VerifierConfig,
}

impl CascadeConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("detector.confidence_threshold", self.detector.confidence_threshold)?;
        check_unit("nms.iou_threshold", self.nms.iou_threshold)?;
        check_unit("verifier.accept_threshold", self.verifier.accept_threshold)?;

        if self.detector.input_size == 0 {
            return Err(CascadeError::Config(
                "detector.input_size must be >= 1".to_string(),
            ));
        }
        if self.verifier.input_size == 0 {
            return Err(CascadeError::Config(
                "verifier.input_size must be >= 1".to_string(),
            ));
        }

        let d = &self.detector;
        if d.scores_output == d.boxes_output
            || d.scores_output == d.count_output
            || d.boxes_output == d.count_output
        {
            return Err(CascadeError::Config(format!(
                "detector output indices must be distinct (scores {}, boxes {}, count {})",
                d.scores_output, d.boxes_output, d.count_output
            )));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CascadeError::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
