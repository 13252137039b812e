//! Pocket assembly and ranking.
//!
//! Folds a per-residue cluster labeling into pocket records, ranks them by
//! mean binding score, and renumbers both the records and the labeling to
//! the canonical `1..K` ids.

use crate::cluster::NOISE;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One detected pocket.
///
/// Populated once during assembly and immutable afterwards; `pocket_id` is
/// assigned exactly once during ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pocket {
    /// Canonical rank, `1..K`
    pub pocket_id: i32,
    /// Residue keys (`"{chain}_{seq}"`) in ascending residue-index order
    pub residue_keys: Vec<String>,
    /// Binding scores parallel to `residue_keys`
    pub scores: Vec<f64>,
    /// Mean of `scores`
    pub average_score: f64,
}

/// Group a labeling into ranked pockets and rewrite the labeling to match.
///
/// Pockets are ordered by `average_score` descending, ties broken by the
/// original cluster id ascending, then renumbered `1..K`. The returned
/// labeling maps every residue to its pocket's id, or `-1` for residues in
/// no pocket, so records and labels always agree.
pub fn assemble_pockets(
    labels: &[i32],
    scores: &[f64],
    residue_keys: &[String],
) -> (Vec<Pocket>, Vec<i32>) {
    debug_assert_eq!(labels.len(), scores.len());
    debug_assert_eq!(labels.len(), residue_keys.len());

    // BTreeMap keeps original cluster ids ordered for the tie-break
    let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        if label == NOISE {
            continue;
        }
        groups.entry(label).or_default().push(index);
    }

    let mut ranked: Vec<(i32, Vec<usize>, f64)> = groups
        .into_iter()
        .map(|(original_id, members)| {
            let average = members.iter().map(|&i| scores[i]).sum::<f64>() / members.len() as f64;
            (original_id, members, average)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut id_mapping: HashMap<i32, i32> = HashMap::new();
    id_mapping.insert(NOISE, NOISE);

    let mut pockets = Vec::with_capacity(ranked.len());
    for (rank, (original_id, members, average)) in ranked.into_iter().enumerate() {
        let pocket_id = rank as i32 + 1;
        id_mapping.insert(original_id, pocket_id);
        pockets.push(Pocket {
            pocket_id,
            residue_keys: members.iter().map(|&i| residue_keys[i].clone()).collect(),
            scores: members.iter().map(|&i| scores[i]).collect(),
            average_score: average,
        });
    }

    let relabeled = labels.iter().map(|label| id_mapping[label]).collect();

    (pockets, relabeled)
}
