//! Error types for crypsis.

use thiserror::Error;

/// Unified error type for all crypsis operations.
///
/// Too few high-score residues for clustering is deliberately *not* an
/// error: the clusterer returns an all-noise labeling instead. Everything
/// below is fatal for the current job and propagates to the caller.
#[derive(Error, Debug)]
pub enum CrypsisError {
    /// Structure file could not be parsed, or a requested chain retained no atoms
    #[error("Structure parse error: {0}")]
    StructureParse(String),

    /// A recorded residue letter disagrees with the structure sequence.
    /// Indicates index drift between the scoring pipeline and the structure.
    #[error(
        "Inconsistent state in chain {chain} at index {index}: \
         recorded residue '{recorded}' but structure has '{actual}'"
    )]
    InconsistentState {
        chain: String,
        index: usize,
        recorded: char,
        actual: char,
    },

    /// Required per-chain embedding file is absent
    #[error("Embedding for chain {chain} not found at {path}")]
    MissingEmbedding { chain: String, path: String },

    /// A feature would average over zero residues
    #[error("Degenerate feature for chain {chain}, residue {index}: no co-located binding residues")]
    DegenerateFeature { chain: String, index: usize },

    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Array shape / index-alignment errors
    #[error("Shape error: {0}")]
    Shape(String),

    /// I/O errors (structure files, embedding files, model weights)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CrypsisError {
    /// Creates a structure parse error.
    pub fn structure_parse(message: impl Into<String>) -> Self {
        CrypsisError::StructureParse(message.into())
    }

    /// Creates an inconsistent-state error for a chain-local residue index.
    pub fn inconsistent_state(
        chain: impl Into<String>,
        index: usize,
        recorded: char,
        actual: char,
    ) -> Self {
        CrypsisError::InconsistentState {
            chain: chain.into(),
            index,
            recorded,
            actual,
        }
    }

    /// Creates a missing-embedding error.
    pub fn missing_embedding(chain: impl Into<String>, path: impl Into<String>) -> Self {
        CrypsisError::MissingEmbedding {
            chain: chain.into(),
            path: path.into(),
        }
    }

    /// Creates a degenerate-feature error.
    pub fn degenerate_feature(chain: impl Into<String>, index: usize) -> Self {
        CrypsisError::DegenerateFeature {
            chain: chain.into(),
            index,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CrypsisError::Config(message.into())
    }

    /// Creates a shape error.
    pub fn shape(message: impl Into<String>) -> Self {
        CrypsisError::Shape(message.into())
    }
}

/// Result type alias for crypsis operations.
pub type Result<T> = std::result::Result<T, CrypsisError>;
