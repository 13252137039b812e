//! Structure file parsing (PDB and mmCIF) into the retained Cα index.

use crypsis_core::{CrypsisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::{AtomRecord, Residue};

/// Retained Cα view of a protein structure.
///
/// Residues keep file order within a chain; chains are concatenated in
/// order of first appearance. Never mutated after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProteinStructure {
    /// All retained residues, in global order
    pub residues: Vec<Residue>,
    /// Chain identifiers in order of first appearance
    pub chain_order: Vec<String>,
    /// Global residue indices per chain
    pub chain_residue_indices: HashMap<String, Vec<usize>>,
}

impl ProteinStructure {
    /// Parse a structure file, dispatching on the extension
    /// (`.pdb` / `.pdb1` → PDB, `.cif` → mmCIF).
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_filtered(path, None)
    }

    /// Parse a structure file, optionally retaining a single chain.
    pub fn from_file_filtered(path: &Path, chain_filter: Option<&str>) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let contents = fs::read_to_string(path)?;

        if name.ends_with(".pdb") || name.ends_with(".pdb1") {
            Self::from_pdb_str_filtered(&contents, chain_filter)
        } else if name.ends_with(".cif") {
            Self::from_cif_str_filtered(&contents, chain_filter)
        } else {
            Err(CrypsisError::structure_parse(format!(
                "unsupported structure format: {}",
                path.display()
            )))
        }
    }

    /// Parse a PDB-format structure from an in-memory string.
    pub fn from_pdb_str(contents: &str) -> Result<Self> {
        Self::from_pdb_str_filtered(contents, None)
    }

    /// Parse a PDB-format structure, optionally retaining a single chain.
    pub fn from_pdb_str_filtered(contents: &str, chain_filter: Option<&str>) -> Result<Self> {
        let mut records = Vec::new();
        let mut in_first_model = true;

        for line in contents.lines() {
            if line.starts_with("MODEL") {
                // MODEL records are 1-based; everything before the first
                // MODEL line belongs to model 1 as well
                continue;
            }
            if line.starts_with("ENDMDL") {
                in_first_model = false;
                continue;
            }
            if !in_first_model {
                continue;
            }

            let record = line.get(0..6).unwrap_or("").trim();
            if record != "ATOM" && record != "HETATM" {
                continue;
            }

            let alt_loc = line.get(16..17).and_then(extract_char);
            if !matches!(alt_loc, None | Some('A')) {
                continue;
            }

            records.push(parse_pdb_atom_line(line, record == "HETATM")?);
        }

        Self::from_records(records, chain_filter)
    }

    /// Parse an mmCIF structure from an in-memory string.
    pub fn from_cif_str(contents: &str) -> Result<Self> {
        Self::from_cif_str_filtered(contents, None)
    }

    /// Parse an mmCIF structure, optionally retaining a single chain.
    pub fn from_cif_str_filtered(contents: &str, chain_filter: Option<&str>) -> Result<Self> {
        let records = parse_cif_atom_site(contents)?;
        Self::from_records(records, chain_filter)
    }

    /// Apply Cα retention and chain bookkeeping to parsed atom records.
    fn from_records(records: Vec<AtomRecord>, chain_filter: Option<&str>) -> Result<Self> {
        let mut structure = ProteinStructure::default();
        // first retained CA wins for a duplicated residue
        let mut seen: HashSet<(String, i32, Option<char>)> = HashSet::new();

        for record in records {
            if !record.is_retained_ca() {
                continue;
            }
            if let Some(chain) = chain_filter {
                if record.chain_id != chain {
                    continue;
                }
            }
            let key = (
                record.chain_id.clone(),
                record.residue_seq,
                record.insertion_code,
            );
            if !seen.insert(key) {
                continue;
            }

            let index = structure.residues.len();
            if !structure.chain_residue_indices.contains_key(&record.chain_id) {
                structure.chain_order.push(record.chain_id.clone());
            }
            structure
                .chain_residue_indices
                .entry(record.chain_id.clone())
                .or_default()
                .push(index);
            structure.residues.push(Residue {
                name: record.residue_name,
                chain_id: record.chain_id,
                seq_number: record.residue_seq,
                coord: record.coord,
            });
        }

        if structure.residues.is_empty() {
            return Err(CrypsisError::structure_parse(match chain_filter {
                Some(chain) => format!("no Cα atoms retained for chain {}", chain),
                None => "no Cα atoms retained from structure".to_string(),
            }));
        }

        Ok(structure)
    }

    /// Number of retained residues.
    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// One-letter sequence over all retained residues, in global order.
    pub fn sequence(&self) -> String {
        self.residues.iter().map(|r| r.one_letter_code()).collect()
    }

    /// One-letter sequence for a single chain, in chain order.
    pub fn chain_sequence(&self, chain_id: &str) -> String {
        self.chain_residue_indices
            .get(chain_id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| self.residues[i].one_letter_code())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cα coordinates over all retained residues, in global order.
    pub fn coordinates(&self) -> Vec<[f64; 3]> {
        self.residues.iter().map(|r| r.coord).collect()
    }

    /// Cα coordinates for a single chain, in chain order.
    pub fn chain_coordinates(&self, chain_id: &str) -> Vec<[f64; 3]> {
        self.chain_residue_indices
            .get(chain_id)
            .map(|indices| indices.iter().map(|&i| self.residues[i].coord).collect())
            .unwrap_or_default()
    }

    /// Residue keys (`"{chain}_{seq}"`) over all residues, in global order.
    pub fn residue_keys(&self) -> Vec<String> {
        self.residues.iter().map(|r| r.key()).collect()
    }
}

fn extract_char(s: &str) -> Option<char> {
    s.chars().next().filter(|c| !c.is_whitespace())
}

fn parse_f64_field(line: &str, range: std::ops::Range<usize>, what: &str) -> Result<f64> {
    line.get(range)
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            CrypsisError::structure_parse(format!("invalid {} field in ATOM record: {:?}", what, line))
        })
}

/// Parse one ATOM/HETATM line using the fixed PDB column layout.
fn parse_pdb_atom_line(line: &str, is_hetatm: bool) -> Result<AtomRecord> {
    let name = line
        .get(12..16)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CrypsisError::structure_parse(format!("missing atom name in ATOM record: {:?}", line))
        })?
        .to_string();

    let residue_name = line
        .get(17..20)
        .map(str::trim)
        .unwrap_or("")
        .to_ascii_uppercase();

    let chain_id = line
        .get(21..22)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("A")
        .to_string();

    let residue_seq = line
        .get(22..26)
        .map(str::trim)
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| {
            CrypsisError::structure_parse(format!("invalid residue number in ATOM record: {:?}", line))
        })?;

    let insertion_code = line.get(26..27).and_then(extract_char);

    let coord = [
        parse_f64_field(line, 30..38, "x")?,
        parse_f64_field(line, 38..46, "y")?,
        parse_f64_field(line, 46..54, "z")?,
    ];

    // Element column may be absent in minimal files; an ATOM-record
    // alpha carbon is then carbon (calcium only occurs as HETATM)
    let mut element = line
        .get(76..78)
        .map(str::trim)
        .unwrap_or("")
        .to_ascii_uppercase();
    if element.is_empty() && !is_hetatm && name == "CA" {
        element = "C".to_string();
    }

    Ok(AtomRecord {
        name,
        residue_name,
        chain_id,
        residue_seq,
        insertion_code,
        coord,
        element,
        is_hetatm,
    })
}

/// Parse the `_atom_site` loop of an mmCIF file.
///
/// Only the columns the retention filter needs are consulted; all other
/// categories in the file are skipped.
fn parse_cif_atom_site(contents: &str) -> Result<Vec<AtomRecord>> {
    let mut lines = contents.lines().peekable();
    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::new();

    while let Some(line) = lines.next() {
        if line.trim() != "loop_" {
            continue;
        }

        // collect this loop's column headers
        columns.clear();
        while let Some(header) = lines.peek() {
            let header = header.trim();
            if header.starts_with('_') {
                columns.push(header.to_string());
                lines.next();
            } else {
                break;
            }
        }

        if !columns.iter().any(|c| c.starts_with("_atom_site.")) {
            continue;
        }

        let col = |tag: &str| -> Option<usize> {
            columns.iter().position(|c| c == &format!("_atom_site.{}", tag))
        };

        let group_col = col("group_PDB");
        let name_col = col("auth_atom_id").or_else(|| col("label_atom_id"));
        let res_name_col = col("auth_comp_id").or_else(|| col("label_comp_id"));
        let chain_col = col("auth_asym_id").or_else(|| col("label_asym_id"));
        let seq_col = col("auth_seq_id").or_else(|| col("label_seq_id"));
        let x_col = col("Cartn_x");
        let y_col = col("Cartn_y");
        let z_col = col("Cartn_z");
        let element_col = col("type_symbol");
        let alt_col = col("label_alt_id");
        let model_col = col("pdbx_PDB_model_num");
        let icode_col = col("pdbx_PDB_ins_code");

        let (name_col, res_name_col, chain_col, seq_col, x_col, y_col, z_col, element_col) =
            match (
                name_col,
                res_name_col,
                chain_col,
                seq_col,
                x_col,
                y_col,
                z_col,
                element_col,
            ) {
                (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f), Some(g), Some(h)) => {
                    (a, b, c, d, e, f, g, h)
                }
                _ => {
                    return Err(CrypsisError::structure_parse(
                        "atom_site loop missing required columns",
                    ))
                }
            };

        let mut first_model: Option<String> = None;

        // data rows run until the next category or loop
        for row in lines.by_ref() {
            let row = row.trim();
            if row.is_empty() || row == "#" {
                break;
            }
            if row.starts_with('_') || row == "loop_" {
                break;
            }

            let fields: Vec<&str> = row
                .split_whitespace()
                .map(|f| f.trim_matches('"').trim_matches('\''))
                .collect();
            if fields.len() < columns.len() {
                continue;
            }

            if let Some(model_col) = model_col {
                let model = fields[model_col].to_string();
                match &first_model {
                    None => first_model = Some(model),
                    Some(first) if *first != model => continue,
                    _ => {}
                }
            }

            if let Some(alt_col) = alt_col {
                if !matches!(fields[alt_col], "." | "?" | "A") {
                    continue;
                }
            }

            // HETATM rows are never retained and may carry non-numeric
            // auth_seq_id values (waters, ions)
            if group_col.map(|c| fields[c] == "HETATM").unwrap_or(false) {
                continue;
            }

            let residue_seq = fields[seq_col].parse::<i32>().map_err(|_| {
                CrypsisError::structure_parse(format!(
                    "invalid residue number in atom_site row: {:?}",
                    fields[seq_col]
                ))
            })?;

            let parse_coord = |idx: usize| -> Result<f64> {
                fields[idx].parse::<f64>().map_err(|_| {
                    CrypsisError::structure_parse(format!(
                        "invalid coordinate in atom_site row: {:?}",
                        fields[idx]
                    ))
                })
            };

            let insertion_code = match icode_col.map(|c| fields[c]) {
                Some(".") | Some("?") | None => None,
                Some(code) => code.chars().next(),
            };

            records.push(AtomRecord {
                name: fields[name_col].to_string(),
                residue_name: fields[res_name_col].to_ascii_uppercase(),
                chain_id: fields[chain_col].to_string(),
                residue_seq,
                insertion_code,
                coord: [parse_coord(x_col)?, parse_coord(y_col)?, parse_coord(z_col)?],
                element: fields[element_col].to_ascii_uppercase(),
                is_hetatm: false,
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca_line(chain: &str, seq: i32, res: &str, x: f64, y: f64, z: f64) -> String {
        format!(
            "ATOM  {:>5}  CA  {:<3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00 10.00           C",
            seq, res, chain, seq, x, y, z
        )
    }

    fn two_chain_pdb() -> String {
        let mut lines = vec![
            ca_line("A", 1, "ALA", 0.0, 0.0, 0.0),
            ca_line("A", 2, "GLY", 3.8, 0.0, 0.0),
            // side-chain atom, never retained
            "ATOM      9  CB  ALA A   1       1.000   1.000   1.000  1.00 10.00           C"
                .to_string(),
            ca_line("B", 1, "LEU", 30.0, 0.0, 0.0),
            // calcium ion shares the CA atom name
            "HETATM   99 CA    CA B 200      40.000   0.000   0.000  1.00 10.00          CA"
                .to_string(),
        ];
        lines.push("END".to_string());
        lines.join("\n")
    }

    #[test]
    fn test_pdb_ca_retention_and_chain_order() {
        let structure = ProteinStructure::from_pdb_str(&two_chain_pdb()).expect("parse pdb");
        assert_eq!(structure.residue_count(), 3);
        assert_eq!(structure.chain_order, vec!["A", "B"]);
        assert_eq!(structure.sequence(), "AGL");
        assert_eq!(
            structure.residue_keys(),
            vec!["A_1", "A_2", "B_1"]
        );
    }

    #[test]
    fn test_pdb_chain_filter() {
        let structure =
            ProteinStructure::from_pdb_str_filtered(&two_chain_pdb(), Some("B")).expect("parse");
        assert_eq!(structure.residue_count(), 1);
        assert_eq!(structure.residues[0].key(), "B_1");

        let missing = ProteinStructure::from_pdb_str_filtered(&two_chain_pdb(), Some("Z"));
        assert!(matches!(missing, Err(CrypsisError::StructureParse(_))));
    }

    #[test]
    fn test_pdb_first_model_only() {
        let pdb = format!(
            "MODEL        1\n{}\nENDMDL\nMODEL        2\n{}\nENDMDL\nEND",
            ca_line("A", 1, "ALA", 0.0, 0.0, 0.0),
            ca_line("A", 1, "ALA", 99.0, 0.0, 0.0),
        );
        let structure = ProteinStructure::from_pdb_str(&pdb).expect("parse");
        assert_eq!(structure.residue_count(), 1);
        assert_eq!(structure.residues[0].coord[0], 0.0);
    }

    #[test]
    fn test_cif_atom_site_parsing() {
        let cif = "\
data_test
loop_
_atom_site.group_PDB
_atom_site.id
_atom_site.type_symbol
_atom_site.label_atom_id
_atom_site.label_alt_id
_atom_site.label_comp_id
_atom_site.label_asym_id
_atom_site.label_seq_id
_atom_site.pdbx_PDB_ins_code
_atom_site.Cartn_x
_atom_site.Cartn_y
_atom_site.Cartn_z
_atom_site.occupancy
_atom_site.B_iso_or_equiv
_atom_site.auth_seq_id
_atom_site.auth_comp_id
_atom_site.auth_asym_id
_atom_site.auth_atom_id
_atom_site.pdbx_PDB_model_num
ATOM 1 C CA . ALA A 1 ? 0.000 0.000 0.000 1.00 10.00 1 ALA A CA 1
ATOM 2 C CB . ALA A 1 ? 1.000 1.000 1.000 1.00 10.00 1 ALA A CB 1
ATOM 3 C CA . GLY A 2 ? 3.800 0.000 0.000 1.00 10.00 2 GLY A CA 1
#
";
        let structure = ProteinStructure::from_cif_str(cif).expect("parse cif");
        assert_eq!(structure.residue_count(), 2);
        assert_eq!(structure.sequence(), "AG");
        assert_eq!(structure.residues[1].coord[0], 3.8);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ProteinStructure::from_file(Path::new("/tmp/structure.xyz"));
        assert!(matches!(err, Err(CrypsisError::StructureParse(_))));
    }

    #[test]
    fn test_malformed_atom_line() {
        let pdb = "ATOM      1  CA  ALA A   1       bad     0.000   0.000  1.00 10.00           C";
        assert!(ProteinStructure::from_pdb_str(pdb).is_err());
    }
}
