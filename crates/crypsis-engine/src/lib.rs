//! # crypsis-engine
//!
//! Pocket detection and refinement engine for cryptic ligand-binding sites.
//!
//! The engine turns per-residue binding scores (produced upstream by a
//! neural sequence model) plus a 3D structure into a ranked set of pockets:
//!
//! 1. **Density clustering** groups high-score residues that sit close in
//!    space; everything else is noise (`-1`).
//! 2. **Boundary refinement** re-examines residues surrounding each cluster
//!    with a pretrained classifier over local embedding context and pulls
//!    under-called residues into the cluster.
//! 3. **Assembly & ranking** folds the final labeling into pocket records,
//!    sorted by mean binding score and renumbered `1..K`.
//!
//! The engine is a pure, synchronous, single-structure computation. It owns
//! no job scheduling, no retries, and no network or database I/O; the only
//! files it touches are the structure file, the per-chain embedding arrays,
//! and the classifier weights.

pub mod cluster;
pub mod geometry;
pub mod pipeline;
pub mod pocket;
pub mod refine;
pub mod structure;

pub use cluster::{cluster_binding_sites, Dbscan, NOISE};
pub use geometry::{build_distance_matrix, chain_distance_matrix, DistanceMatrix};
pub use pipeline::{PredictionPipeline, PredictionResult};
pub use pocket::{assemble_pockets, Pocket};
pub use refine::{refine_labels, BoundaryClassifier, Classifier, EmbeddingStore};
pub use structure::{ProteinStructure, Residue};

pub use crypsis_core::{ClusteringConfig, CrypsisError, EngineConfig, RefinementConfig, Result};
