//! Configuration for the detection and refinement stages.
//!
//! All thresholds are tunable; the `Default` impls carry the values the
//! production models were calibrated against.

use crate::errors::{CrypsisError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters for density clustering of high-score residues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Residues with a binding score strictly above this take part in clustering
    pub score_threshold: f64,

    /// Max distance (Å) for two residues to be density-reachable
    pub eps: f64,

    /// Minimum points (including the point itself) within `eps` for a core point
    pub min_samples: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.7,
            eps: 5.0,
            min_samples: 3,
        }
    }
}

impl ClusteringConfig {
    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(CrypsisError::config(format!(
                "score_threshold must be in [0, 1], got {}",
                self.score_threshold
            )));
        }
        if self.eps <= 0.0 || !self.eps.is_finite() {
            return Err(CrypsisError::config(format!(
                "eps must be positive and finite, got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(CrypsisError::config("min_samples must be at least 1"));
        }
        Ok(())
    }
}

/// Parameters for classifier-based pocket boundary refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    /// Radius (Å) defining the co-located binding residues used for feature means
    pub positive_distance_threshold: f64,

    /// Radius (Å) defining the non-binding candidate pool around a cluster
    pub negative_distance_threshold: f64,

    /// A candidate joins the cluster when its predicted probability is
    /// strictly above this
    pub decision_threshold: f64,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            positive_distance_threshold: 15.0,
            negative_distance_threshold: 10.0,
            decision_threshold: 0.7,
        }
    }
}

impl RefinementConfig {
    /// Validate parameter ranges.
    ///
    /// The candidate radius must not exceed the feature radius: every
    /// candidate then has at least one binding residue inside the feature
    /// radius, so feature means are never taken over zero residues.
    pub fn validate(&self) -> Result<()> {
        if self.positive_distance_threshold <= 0.0 {
            return Err(CrypsisError::config(format!(
                "positive_distance_threshold must be positive, got {}",
                self.positive_distance_threshold
            )));
        }
        if self.negative_distance_threshold <= 0.0 {
            return Err(CrypsisError::config(format!(
                "negative_distance_threshold must be positive, got {}",
                self.negative_distance_threshold
            )));
        }
        if self.negative_distance_threshold > self.positive_distance_threshold {
            return Err(CrypsisError::config(format!(
                "negative_distance_threshold ({}) must not exceed positive_distance_threshold ({})",
                self.negative_distance_threshold, self.positive_distance_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(CrypsisError::config(format!(
                "decision_threshold must be in [0, 1], got {}",
                self.decision_threshold
            )));
        }
        Ok(())
    }
}

/// Combined engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusteringConfig,
    pub refinement: RefinementConfig,
}

impl EngineConfig {
    /// Load from a TOML file. Missing keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&contents)
            .map_err(|e| CrypsisError::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        self.refinement.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clustering.score_threshold, 0.7);
        assert_eq!(config.clustering.eps, 5.0);
        assert_eq!(config.clustering.min_samples, 3);
        assert_eq!(config.refinement.positive_distance_threshold, 15.0);
        assert_eq!(config.refinement.negative_distance_threshold, 10.0);
        assert_eq!(config.refinement.decision_threshold, 0.7);
    }

    #[test]
    fn test_rejects_inverted_radii() {
        let config = RefinementConfig {
            positive_distance_threshold: 8.0,
            negative_distance_threshold: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let config = ClusteringConfig {
            score_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClusteringConfig {
            min_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let parsed: EngineConfig =
            toml::from_str("[clustering]\nscore_threshold = 0.65\n").expect("parse");
        assert_eq!(parsed.clustering.score_threshold, 0.65);
        assert_eq!(parsed.clustering.eps, 5.0);
        assert_eq!(parsed.refinement.decision_threshold, 0.7);
    }
}
