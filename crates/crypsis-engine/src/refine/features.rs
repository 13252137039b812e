//! Feature construction for boundary reclassification.
//!
//! Every example is one residue, featurized as the concatenation of its
//! own embedding and the element-wise mean of the embeddings of cluster
//! (binding) residues inside the positive radius around it. Positive
//! examples are the cluster members themselves; candidate examples are the
//! non-member residues inside the negative radius of any member.

use crate::geometry::{neighbors_within, DistanceMatrix};
use crypsis_core::{CrypsisError, RefinementConfig, Result};
use ndarray::{Array1, Array2};
use std::collections::BTreeSet;

/// Feature matrix for one cluster, rows parallel to `labels`/`indices`.
#[derive(Debug, Clone)]
pub struct ClusterExamples {
    /// One row per example, `2 * embedding_dim` columns
    pub features: Array2<f32>,
    /// 1 for cluster members, 0 for candidate-pool residues
    pub labels: Vec<u8>,
    /// Chain-local residue index per row
    pub indices: Vec<usize>,
}

impl ClusterExamples {
    /// Row indices of candidate-pool examples.
    pub fn candidate_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == 0)
            .map(|(row, _)| row)
    }
}

/// Featurize one residue against a set of co-located binding residues.
///
/// A mean over zero residues would poison the classifier input with NaN,
/// so an empty `close_binding` is rejected outright.
pub fn feature_row(
    chain_id: &str,
    embedding: &Array2<f32>,
    index: usize,
    close_binding: &[usize],
) -> Result<Array1<f32>> {
    if close_binding.is_empty() {
        return Err(CrypsisError::degenerate_feature(chain_id, index));
    }

    let dim = embedding.ncols();
    let mut row = Array1::<f32>::zeros(2 * dim);

    row.slice_mut(ndarray::s![..dim]).assign(&embedding.row(index));

    let mut mean = Array1::<f32>::zeros(dim);
    for &binding_index in close_binding {
        mean += &embedding.row(binding_index);
    }
    mean /= close_binding.len() as f32;
    row.slice_mut(ndarray::s![dim..]).assign(&mean);

    Ok(row)
}

/// Build the full example set for one cluster of one chain.
///
/// `binding` holds the chain-local indices currently assigned to the
/// cluster. Candidate features are computed against this same (original)
/// binding set, and the candidate pool is iterated in ascending index
/// order so the output is reproducible.
pub fn build_cluster_examples(
    chain_id: &str,
    embedding: &Array2<f32>,
    distances: &DistanceMatrix,
    binding: &[usize],
    config: &RefinementConfig,
) -> Result<ClusterExamples> {
    let binding_set: BTreeSet<usize> = binding.iter().copied().collect();

    let mut rows: Vec<Array1<f32>> = Vec::new();
    let mut labels: Vec<u8> = Vec::new();
    let mut indices: Vec<usize> = Vec::new();
    let mut candidate_pool: BTreeSet<usize> = BTreeSet::new();

    for &member in binding {
        let close = neighbors_within(distances, member, config.positive_distance_threshold);
        let close_binding: Vec<usize> = close
            .iter()
            .copied()
            .filter(|i| binding_set.contains(i))
            .collect();

        rows.push(feature_row(chain_id, embedding, member, &close_binding)?);
        labels.push(1);
        indices.push(member);

        for neighbor in neighbors_within(distances, member, config.negative_distance_threshold) {
            if !binding_set.contains(&neighbor) {
                candidate_pool.insert(neighbor);
            }
        }
    }

    for &candidate in &candidate_pool {
        let close = neighbors_within(distances, candidate, config.positive_distance_threshold);
        let close_binding: Vec<usize> = close
            .iter()
            .copied()
            .filter(|i| binding_set.contains(i))
            .collect();

        rows.push(feature_row(chain_id, embedding, candidate, &close_binding)?);
        labels.push(0);
        indices.push(candidate);
    }

    let dim = 2 * embedding.ncols();
    let mut features = Array2::<f32>::zeros((rows.len(), dim));
    for (i, row) in rows.iter().enumerate() {
        features.row_mut(i).assign(row);
    }

    Ok(ClusterExamples {
        features,
        labels,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_distance_matrix;
    use ndarray::array;

    fn line_embedding(n: usize) -> Array2<f32> {
        // residue i embeds as [i, 10*i]
        Array2::from_shape_fn((n, 2), |(i, j)| if j == 0 { i as f32 } else { 10.0 * i as f32 })
    }

    fn line_coords(n: usize, spacing: f64) -> Vec<[f64; 3]> {
        (0..n).map(|i| [i as f64 * spacing, 0.0, 0.0]).collect()
    }

    #[test]
    fn test_feature_row_concatenates_own_and_mean() {
        let embedding = line_embedding(4);
        let row = feature_row("A", &embedding, 0, &[1, 3]).expect("feature");
        // own = [0, 0]; mean([1,10], [3,30]) = [2, 20]
        assert_eq!(row, array![0.0, 0.0, 2.0, 20.0]);
    }

    #[test]
    fn test_feature_row_rejects_empty_mean() {
        let embedding = line_embedding(4);
        let err = feature_row("A", &embedding, 2, &[]).unwrap_err();
        assert!(matches!(
            err,
            CrypsisError::DegenerateFeature { index: 2, .. }
        ));
    }

    #[test]
    fn test_cluster_examples_layout() {
        // residues 0,1 bound; 2 within 10 Å of 1; 3 far away
        let coords = vec![
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [12.0, 0.0, 0.0],
            [60.0, 0.0, 0.0],
        ];
        let distances = build_distance_matrix(&coords);
        let embedding = line_embedding(4);
        let config = RefinementConfig::default();

        let examples =
            build_cluster_examples("A", &embedding, &distances, &[0, 1], &config).expect("build");

        // two positives then one candidate (residue 2, 8 Å from residue 1)
        assert_eq!(examples.labels, vec![1, 1, 0]);
        assert_eq!(examples.indices, vec![0, 1, 2]);
        assert_eq!(examples.features.nrows(), 3);
        assert_eq!(examples.features.ncols(), 4);
        assert_eq!(examples.candidate_rows().collect::<Vec<_>>(), vec![2]);

        // candidate features use the original binding set: residues 0 and 1
        // are both within 15 Å of residue 2, mean = [0.5, 5.0]
        let candidate_row = examples.features.row(2);
        assert_eq!(candidate_row[0], 2.0);
        assert_eq!(candidate_row[2], 0.5);
        assert_eq!(candidate_row[3], 5.0);
    }

    #[test]
    fn test_candidate_pool_is_deduplicated_and_sorted() {
        // residues 0,2 bound; residue 1 within 10 Å of both
        let coords = line_coords(3, 6.0);
        let distances = build_distance_matrix(&coords);
        let embedding = line_embedding(3);
        let config = RefinementConfig::default();

        let examples =
            build_cluster_examples("A", &embedding, &distances, &[0, 2], &config).expect("build");

        let candidates: Vec<usize> = examples
            .candidate_rows()
            .map(|row| examples.indices[row])
            .collect();
        assert_eq!(candidates, vec![1]);
    }

    #[test]
    fn test_empty_binding_set_yields_no_examples() {
        let coords = line_coords(3, 6.0);
        let distances = build_distance_matrix(&coords);
        let embedding = line_embedding(3);
        let config = RefinementConfig::default();

        let examples =
            build_cluster_examples("A", &embedding, &distances, &[], &config).expect("build");
        assert_eq!(examples.features.nrows(), 0);
        assert!(examples.labels.is_empty());
    }
}
