//! Per-chain residue embedding store.
//!
//! The scoring model persists one embedding matrix per chain as
//! `"{chain_id}.npy"` (float32, `seq_len x embedding_dim`) inside a job
//! directory. The engine only ever reads these files.

use crypsis_core::{CrypsisError, Result};
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Read-only handle on a directory of chain-keyed embedding files.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a chain's embedding file.
    pub fn chain_path(&self, chain_id: &str) -> PathBuf {
        self.dir.join(format!("{}.npy", chain_id))
    }

    /// Load one chain's embedding matrix.
    ///
    /// An absent file is fatal for the chain's refinement; a row count that
    /// disagrees with the chain's residue count means the embedding and the
    /// structure are index-shifted relative to each other.
    pub fn load_chain(&self, chain_id: &str, expected_rows: usize) -> Result<Array2<f32>> {
        let path = self.chain_path(chain_id);
        if !path.exists() {
            return Err(CrypsisError::missing_embedding(
                chain_id,
                path.display().to_string(),
            ));
        }

        let embedding = read_embedding(&path)?;
        if embedding.nrows() != expected_rows {
            return Err(CrypsisError::shape(format!(
                "embedding for chain {} has {} rows, chain has {} residues",
                chain_id,
                embedding.nrows(),
                expected_rows
            )));
        }
        Ok(embedding)
    }
}

fn read_embedding(path: &Path) -> Result<Array2<f32>> {
    let file = File::open(path)?;
    Array2::<f32>::read_npy(file)
        .map_err(|e| CrypsisError::shape(format!("failed to read {}: {}", path.display(), e)))
}
