//! Classifier-based refinement of pocket cluster boundaries.
//!
//! Density clustering under-calls residues at pocket rims: a residue whose
//! own score fell just short of the clustering threshold can still belong
//! to the pocket. Refinement re-examines the shell of residues around each
//! cluster with a pretrained classifier over local embedding context and
//! pulls convincing candidates in. Cluster membership of existing members
//! is never revisited; refinement only ever expands.

pub mod classifier;
pub mod embeddings;
pub mod features;

pub use classifier::{BoundaryClassifier, Classifier};
pub use embeddings::EmbeddingStore;
pub use features::{build_cluster_examples, feature_row, ClusterExamples};

use crate::cluster::NOISE;
use crate::geometry::{chain_distance_matrix, DistanceMatrix};
use crate::structure::ProteinStructure;
use crypsis_core::{CrypsisError, RefinementConfig, Result};
use ndarray::Array2;
use std::collections::BTreeSet;
use std::path::Path;

/// Everything the per-chain refinement step reads.
pub struct ChainContext<'a> {
    /// Chain identifier (for diagnostics)
    pub chain_id: &'a str,
    /// One-letter structure sequence of the chain, in chain order
    pub sequence: &'a [char],
    /// Chain-local Cα distance matrix
    pub distances: &'a DistanceMatrix,
    /// Chain embedding matrix, rows parallel to the chain sequence
    pub embedding: &'a Array2<f32>,
}

/// Refine one chain's cluster labels in place.
///
/// `recorded_letters` carries the residue letters the scoring pipeline
/// recorded for this chain; any disagreement with the structure sequence
/// means the two are index-shifted and the job must die rather than
/// refine garbage.
///
/// Clusters are processed in ascending id order. Acceptance overwrites
/// `labels` keyed by residue index, so when two clusters both claim a
/// candidate, the later-processed cluster wins. That last-write-wins
/// behavior is deliberate, documented, and covered by tests.
pub fn refine_chain_labels<C: Classifier>(
    ctx: &ChainContext,
    recorded_letters: &[char],
    labels: &mut [i32],
    model: &C,
    config: &RefinementConfig,
) -> Result<()> {
    let n = labels.len();
    if ctx.sequence.len() != n || recorded_letters.len() != n {
        return Err(CrypsisError::shape(format!(
            "chain {}: sequence ({}), recorded letters ({}) and labels ({}) must align",
            ctx.chain_id,
            ctx.sequence.len(),
            recorded_letters.len(),
            n
        )));
    }
    if 2 * ctx.embedding.ncols() != model.input_dim() {
        return Err(CrypsisError::shape(format!(
            "chain {}: embedding dim {} incompatible with classifier input dim {}",
            ctx.chain_id,
            ctx.embedding.ncols(),
            model.input_dim()
        )));
    }

    let cluster_ids: BTreeSet<i32> = labels.iter().copied().filter(|&l| l != NOISE).collect();

    for cluster_id in cluster_ids {
        let binding: Vec<usize> = (0..n).filter(|&i| labels[i] == cluster_id).collect();
        if binding.is_empty() {
            // every member was absorbed by an earlier cluster's expansion
            continue;
        }

        for &member in &binding {
            if recorded_letters[member] != ctx.sequence[member] {
                return Err(CrypsisError::inconsistent_state(
                    ctx.chain_id,
                    member,
                    recorded_letters[member],
                    ctx.sequence[member],
                ));
            }
        }

        let examples =
            build_cluster_examples(ctx.chain_id, ctx.embedding, ctx.distances, &binding, config)?;
        if examples.features.nrows() == 0 {
            continue;
        }

        let probabilities = model.classify(examples.features.view())?;

        let mut accepted = 0usize;
        for row in examples.candidate_rows() {
            if f64::from(probabilities[row]) > config.decision_threshold {
                labels[examples.indices[row]] = cluster_id;
                accepted += 1;
            }
        }

        log::debug!(
            "chain {} cluster {}: {} members, {} candidates, {} accepted",
            ctx.chain_id,
            cluster_id,
            binding.len(),
            examples.labels.iter().filter(|&&l| l == 0).count(),
            accepted
        );
    }

    Ok(())
}

/// Refine the full multi-chain labeling.
///
/// Chains are processed independently, in order of first appearance; each
/// chain's distance matrix is derived from the structure file and its
/// embedding loaded from the chain-keyed store. The refined labeling is
/// assembled back in residue order.
pub fn refine_labels<C: Classifier>(
    structure: &ProteinStructure,
    structure_path: &Path,
    recorded_letters: &[char],
    labels: &[i32],
    store: &EmbeddingStore,
    model: &C,
    config: &RefinementConfig,
) -> Result<Vec<i32>> {
    if labels.len() != structure.residue_count() || recorded_letters.len() != labels.len() {
        return Err(CrypsisError::shape(format!(
            "labels ({}) and recorded letters ({}) must cover all {} residues",
            labels.len(),
            recorded_letters.len(),
            structure.residue_count()
        )));
    }

    let mut refined = labels.to_vec();

    for chain_id in &structure.chain_order {
        let global_indices = &structure.chain_residue_indices[chain_id];

        let sequence: Vec<char> = global_indices
            .iter()
            .map(|&i| structure.residues[i].one_letter_code())
            .collect();
        let chain_letters: Vec<char> =
            global_indices.iter().map(|&i| recorded_letters[i]).collect();
        let mut chain_labels: Vec<i32> = global_indices.iter().map(|&i| refined[i]).collect();

        let distances = chain_distance_matrix(structure_path, chain_id)?;
        let embedding = store.load_chain(chain_id, global_indices.len())?;

        let ctx = ChainContext {
            chain_id: chain_id.as_str(),
            sequence: &sequence,
            distances: &distances,
            embedding: &embedding,
        };
        refine_chain_labels(&ctx, &chain_letters, &mut chain_labels, model, config)?;

        for (local, &global) in global_indices.iter().enumerate() {
            refined[global] = chain_labels[local];
        }
    }

    Ok(refined)
}
