//! Raw atom records as read from structure files.

/// A single atom line before Cα retention filtering.
///
/// Only the fields the retention filter and residue construction read are
/// kept; everything else in the source record is dropped at parse time.
#[derive(Debug, Clone)]
pub struct AtomRecord {
    /// Atom name (e.g., "CA", "CB", "N")
    pub name: String,

    /// Residue name (three-letter code)
    pub residue_name: String,

    /// Chain identifier
    pub chain_id: String,

    /// Residue sequence number from the file
    pub residue_seq: i32,

    /// Insertion code, if any
    pub insertion_code: Option<char>,

    /// 3D coordinates [x, y, z] in Angstroms
    pub coord: [f64; 3],

    /// Element symbol (e.g., "C", "N", "O")
    pub element: String,

    /// Whether this came from a HETATM record
    pub is_hetatm: bool,
}

impl AtomRecord {
    /// Retention rule for the residue index: alpha-carbon carbon atoms from
    /// ATOM records. The element check excludes calcium ions, which share
    /// the "CA" atom name.
    pub fn is_retained_ca(&self) -> bool {
        !self.is_hetatm && self.name == "CA" && self.element == "C"
    }
}
