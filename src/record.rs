//! The parsed structure record that sources produce and datasets serve.

use crate::alphabet;
use crate::attrs::AttrSelection;
use crate::error::{DatasetError, DatasetResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Heavy atoms tracked per residue (atom14 layout).
pub const ATOMS_PER_RESIDUE: usize = 14;

/// One molecular structure.
///
/// All per-residue arrays are parallel: entry `i` of each describes residue `i`.
/// `sequence` holds one-letter codes and has one character per residue.
/// Records are immutable once produced; transforms take them by value and
/// return a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub idcode: String,
    pub resolution: Option<f64>,
    pub sequence: String,
    pub residue_token: Vec<u8>,
    pub residue_index: Vec<i32>,
    pub residue_mask: Vec<bool>,
    /// 0-based chain assignment per residue; chains are contiguous.
    pub chain_token: Vec<u32>,
    pub atom_token: Vec<[u8; ATOMS_PER_RESIDUE]>,
    pub atom_coord: Vec<[[f32; 3]; ATOMS_PER_RESIDUE]>,
    pub atom_mask: Vec<[bool; ATOMS_PER_RESIDUE]>,
}

impl StructureRecord {
    /// Number of residues.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.residue_token.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residue_token.is_empty()
    }

    /// Number of chains, taken as one past the largest chain token.
    #[must_use]
    pub fn num_chains(&self) -> usize {
        self.chain_token
            .iter()
            .max()
            .map_or(0, |&c| c as usize + 1)
    }

    /// The sequence re-derived from residue tokens.
    #[must_use]
    pub fn token_sequence(&self) -> String {
        self.residue_token.iter().map(|&t| alphabet::letter(t)).collect()
    }

    /// Check that every per-residue array has one entry per residue token.
    ///
    /// # Errors
    /// Returns [`DatasetError::Integrity`] naming the first mismatching array.
    pub fn validate(&self) -> DatasetResult<()> {
        let n = self.residue_token.len();
        let lengths = [
            ("sequence", self.sequence.chars().count()),
            ("residue_index", self.residue_index.len()),
            ("residue_mask", self.residue_mask.len()),
            ("chain_token", self.chain_token.len()),
            ("atom_token", self.atom_token.len()),
            ("atom_coord", self.atom_coord.len()),
            ("atom_mask", self.atom_mask.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(DatasetError::integrity(format!(
                    "{}: {name} has {len} entries but residue_token has {n}",
                    self.idcode
                )));
            }
        }
        Ok(())
    }

    /// Project the record onto the selected attributes as a JSON object keyed by
    /// attribute name.
    ///
    /// # Errors
    /// Fails only if the record cannot be serialized (non-finite floats are
    /// rendered as `null` by `serde_json`, so this is not expected in practice).
    pub fn select(&self, attrs: &AttrSelection) -> DatasetResult<Map<String, Value>> {
        let value = serde_json::to_value(self)
            .map_err(|e| DatasetError::integrity(format!("{}: {e}", self.idcode)))?;
        let Value::Object(mut fields) = value else {
            return Err(DatasetError::integrity(format!(
                "{}: record did not serialize to an object",
                self.idcode
            )));
        };
        fields.retain(|key, _| attrs.contains_name(key));
        Ok(fields)
    }
}
