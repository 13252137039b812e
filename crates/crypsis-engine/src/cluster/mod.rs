//! Density clustering of high-score residues into candidate pockets.

pub mod dbscan;

pub use dbscan::{Dbscan, NOISE};

use crypsis_core::ClusteringConfig;

/// Cluster residues whose binding score exceeds the configured threshold.
///
/// Clustering runs over the 3D coordinates of the high-score subset only;
/// the score takes no part in the distance computation. Labels are mapped
/// back onto the full residue index: below-threshold residues are always
/// `-1`, the rest take the subset label. When fewer than `min_samples`
/// residues pass the threshold no pocket can form and the labeling is all
/// `-1` — that is a sentinel result, not an error.
pub fn cluster_binding_sites(
    coords: &[[f64; 3]],
    scores: &[f64],
    config: &ClusteringConfig,
) -> Vec<i32> {
    debug_assert_eq!(coords.len(), scores.len());

    let high_score: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > config.score_threshold)
        .map(|(i, _)| i)
        .collect();

    let mut labels = vec![NOISE; coords.len()];

    if high_score.len() < config.min_samples {
        log::debug!(
            "{} residues above threshold {} (< min_samples {}), no clusters",
            high_score.len(),
            config.score_threshold,
            config.min_samples
        );
        return labels;
    }

    let subset: Vec<[f64; 3]> = high_score.iter().map(|&i| coords[i]).collect();
    let subset_labels = Dbscan::new(config.eps, config.min_samples).fit(&subset);

    for (&index, &label) in high_score.iter().zip(subset_labels.iter()) {
        labels[index] = label;
    }

    let n_clusters = labels.iter().copied().max().map_or(0, |m| (m + 1).max(0));
    log::debug!(
        "clustered {} high-score residues into {} clusters",
        high_score.len(),
        n_clusters
    );

    labels
}
