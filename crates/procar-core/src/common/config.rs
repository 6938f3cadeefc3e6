//! Analysis settings shared by every front end.
//!
//! Settings load from a camelCase JSON document; every field is optional and
//! falls back to the defaults in [`super::constants`].

use super::constants::{
    DEFAULT_HIGHLIGHT_THRESHOLD, DEFAULT_LINEWIDTH_SCALE, DEFAULT_OTHER_CONTRIBUTOR_LIMIT,
    DEFAULT_TOP_N, DEFAULT_WINDOW_HALF_WIDTH,
};
use crate::domain::WindowMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub top_n: usize,
    pub highlight_threshold: f64,
    pub other_contributor_limit: usize,
    pub window_mode: WindowMode,
    pub spin_orbit: bool,
    pub default_window_half_width: f64,
    pub linewidth_scale: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            highlight_threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
            other_contributor_limit: DEFAULT_OTHER_CONTRIBUTOR_LIMIT,
            window_mode: WindowMode::default(),
            spin_orbit: false,
            default_window_half_width: DEFAULT_WINDOW_HALF_WIDTH,
            linewidth_scale: DEFAULT_LINEWIDTH_SCALE,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisConfigError> {
        if self.top_n == 0 {
            return Err(AnalysisConfigError::Invalid(
                "topN must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.highlight_threshold) {
            return Err(AnalysisConfigError::Invalid(format!(
                "highlightThreshold must lie in [0, 1], got {}",
                self.highlight_threshold
            )));
        }
        if !self.default_window_half_width.is_finite() || self.default_window_half_width <= 0.0 {
            return Err(AnalysisConfigError::Invalid(format!(
                "defaultWindowHalfWidth must be a positive energy, got {}",
                self.default_window_half_width
            )));
        }
        if !self.linewidth_scale.is_finite() || self.linewidth_scale < 0.0 {
            return Err(AnalysisConfigError::Invalid(format!(
                "linewidthScale must be non-negative, got {}",
                self.linewidth_scale
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisConfigError {
    #[error("failed to read analysis config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse analysis config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid analysis config: {0}")]
    Invalid(String),
}

pub fn load_analysis_config(
    config_path: impl AsRef<Path>,
) -> Result<AnalysisConfig, AnalysisConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| AnalysisConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config: AnalysisConfig =
        serde_json::from_str(&source).map_err(|source| AnalysisConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}
