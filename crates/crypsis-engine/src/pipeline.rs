//! End-to-end pocket prediction pipeline.
//!
//! One pipeline run = one structure: cluster the binding scores, refine
//! cluster boundaries with the classifier, assemble and rank pockets. The
//! pipeline is synchronous and owns no scheduling; callers embed it in
//! whatever job machinery they run.

use crate::cluster::cluster_binding_sites;
use crate::pocket::{assemble_pockets, Pocket};
use crate::refine::{refine_labels, Classifier, EmbeddingStore};
use crate::structure::ProteinStructure;
use crypsis_core::{CrypsisError, EngineConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Final output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Canonical per-residue labels: pocket id `>= 1` or `-1`
    pub labels: Vec<i32>,
    /// Ranked pockets, best first
    pub pockets: Vec<Pocket>,
    /// Residue keys (`"{chain}_{seq}"`), index-aligned with `labels`
    pub residue_keys: Vec<String>,
    /// One-letter sequence, index-aligned with `labels`
    pub sequence: String,
}

/// Pocket detection and refinement engine.
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    config: EngineConfig,
}

impl PredictionPipeline {
    /// Create a pipeline with a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full run: cluster, refine, assemble.
    ///
    /// `scores` must be index-aligned with the structure's retained
    /// residues. `structure_path` is re-read per chain by the distance
    /// matrix provider; `store` and `model` supply the refinement inputs.
    pub fn run<C: Classifier>(
        &self,
        structure: &ProteinStructure,
        structure_path: &Path,
        scores: &[f64],
        store: &EmbeddingStore,
        model: &C,
    ) -> Result<PredictionResult> {
        let raw_labels = self.cluster(structure, scores)?;

        let recorded_letters: Vec<char> =
            structure.residues.iter().map(|r| r.one_letter_code()).collect();

        log::info!(
            "refining {} raw clusters across {} chains",
            raw_labels.iter().copied().max().map_or(0, |m| m + 1).max(0),
            structure.chain_order.len()
        );
        let refined = refine_labels(
            structure,
            structure_path,
            &recorded_letters,
            &raw_labels,
            store,
            model,
            &self.config.refinement,
        )?;

        Ok(self.assemble(structure, scores, &refined))
    }

    /// Clustering-only run for deployments without a boundary model.
    pub fn run_unrefined(
        &self,
        structure: &ProteinStructure,
        scores: &[f64],
    ) -> Result<PredictionResult> {
        let labels = self.cluster(structure, scores)?;
        Ok(self.assemble(structure, scores, &labels))
    }

    fn cluster(&self, structure: &ProteinStructure, scores: &[f64]) -> Result<Vec<i32>> {
        if scores.len() != structure.residue_count() {
            return Err(CrypsisError::shape(format!(
                "{} scores for {} residues",
                scores.len(),
                structure.residue_count()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite() || **s < 0.0 || **s > 1.0) {
            return Err(CrypsisError::shape(format!(
                "binding scores must lie in [0, 1], got {}",
                bad
            )));
        }

        Ok(cluster_binding_sites(
            &structure.coordinates(),
            scores,
            &self.config.clustering,
        ))
    }

    fn assemble(
        &self,
        structure: &ProteinStructure,
        scores: &[f64],
        labels: &[i32],
    ) -> PredictionResult {
        let residue_keys = structure.residue_keys();
        let (pockets, canonical) = assemble_pockets(labels, scores, &residue_keys);

        log::info!("assembled {} pockets", pockets.len());

        PredictionResult {
            labels: canonical,
            pockets,
            residue_keys,
            sequence: structure.sequence(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypsis_core::ClusteringConfig;

    fn pipeline() -> PredictionPipeline {
        PredictionPipeline::new(EngineConfig::default()).expect("valid config")
    }

    fn tight_and_far_structure() -> ProteinStructure {
        let mut lines: Vec<String> = Vec::new();
        let coords: Vec<[f64; 3]> = vec![
            [0.0, 0.0, 0.0],
            [0.7, 0.0, 0.0],
            [0.0, 0.7, 0.0],
            [80.0, 0.0, 0.0],
            [120.0, 0.0, 0.0],
            [160.0, 0.0, 0.0],
            [200.0, 0.0, 0.0],
            [240.0, 0.0, 0.0],
            [280.0, 0.0, 0.0],
            [320.0, 0.0, 0.0],
        ];
        for (i, c) in coords.iter().enumerate() {
            lines.push(format!(
                "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00 10.00           C",
                i + 1,
                i + 1,
                c[0],
                c[1],
                c[2]
            ));
        }
        lines.push("END".to_string());
        ProteinStructure::from_pdb_str(&lines.join("\n")).expect("parse")
    }

    #[test]
    fn test_unrefined_run_finds_single_pocket() {
        let structure = tight_and_far_structure();
        let scores = vec![0.9, 0.9, 0.9, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];

        let result = pipeline().run_unrefined(&structure, &scores).expect("run");

        assert_eq!(result.labels, vec![1, 1, 1, -1, -1, -1, -1, -1, -1, -1]);
        assert_eq!(result.pockets.len(), 1);
        assert!((result.pockets[0].average_score - 0.9).abs() < 1e-12);
        assert_eq!(result.pockets[0].residue_keys, vec!["A_1", "A_2", "A_3"]);
        assert_eq!(result.sequence.len(), 10);
    }

    #[test]
    fn test_score_length_mismatch_is_fatal() {
        let structure = tight_and_far_structure();
        let scores = vec![0.5; 9];
        assert!(pipeline().run_unrefined(&structure, &scores).is_err());
    }

    #[test]
    fn test_out_of_range_score_is_fatal() {
        let structure = tight_and_far_structure();
        let mut scores = vec![0.5; 10];
        scores[3] = f64::NAN;
        assert!(pipeline().run_unrefined(&structure, &scores).is_err());

        scores[3] = 1.2;
        assert!(pipeline().run_unrefined(&structure, &scores).is_err());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = EngineConfig {
            clustering: ClusteringConfig {
                eps: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(PredictionPipeline::new(config).is_err());
    }
}
