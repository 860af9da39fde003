//! Analysis thresholds and graph sizing, loadable from TOML

use crate::error::ValidationError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default minimum support for a frequent itemset
pub const DEFAULT_MIN_SUPPORT: f64 = 0.001;
/// Default minimum confidence for a retained rule
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.15;
/// Default smallest rendered node size
pub const DEFAULT_MIN_SIZE: f64 = 300.0;
/// Default largest rendered node size
pub const DEFAULT_MAX_SIZE: f64 = 3000.0;

/// Parameters for one mining run.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// min_support = 0.01
/// max_len = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Minimum fraction of transactions an itemset must appear in
    pub min_support: f64,
    /// Minimum confidence a rule must reach to be kept
    pub min_confidence: f64,
    /// Largest itemset size to mine; unbounded when `None`
    pub max_len: Option<usize>,
    /// Node size assigned to the smallest aggregate
    pub min_size: f64,
    /// Node size assigned to the largest aggregate
    pub max_size: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_len: None,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse analysis config")?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Check that every threshold is inside its range
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(ValidationError::InvalidConfig(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ValidationError::InvalidConfig(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.max_len == Some(0) {
            return Err(ValidationError::InvalidConfig(
                "max_len must be at least 1".to_string(),
            ));
        }
        if !self.min_size.is_finite() || !self.max_size.is_finite() {
            return Err(ValidationError::InvalidConfig(
                "node sizes must be finite".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(ValidationError::InvalidConfig(format!(
                "min_size ({}) must not exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}
