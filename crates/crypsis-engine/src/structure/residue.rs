//! Residue entries of the retained Cα index.

use serde::{Deserialize, Serialize};

/// One retained residue: a Cα atom with its chain and sequence identity.
///
/// Immutable after parsing; the binding score lives in a parallel array
/// owned by the caller, index-aligned with the residue order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Residue {
    /// Residue name (three-letter code)
    pub name: String,

    /// Chain identifier
    pub chain_id: String,

    /// Residue sequence number from the structure file
    pub seq_number: i32,

    /// Cα position [x, y, z] in Angstroms
    pub coord: [f64; 3],
}

impl Residue {
    /// One-letter code, `'X'` for non-standard residues.
    pub fn one_letter_code(&self) -> char {
        super::one_letter_code(&self.name)
    }

    /// Key used in pocket records and the job output: `"{chain}_{seq}"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.chain_id, self.seq_number)
    }
}
