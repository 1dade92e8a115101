//! Metadata index: one fixed-shape row per structure.
//!
//! Every row carries the same column set regardless of how many chains its
//! structure has:
//!
//! | column | type | meaning |
//! |---|---|---|
//! | `idcode` | string | structure identifier |
//! | `num_res` | u32 | total residue count |
//! | `standard` | bool | `false` only when every residue is [`UNK_TOKEN`] |
//! | `resolution` | f64, nullable | experimental resolution in Å |
//! | `num_res_0` .. `num_res_31` | u32, nullable | residues per chain slot |
//!
//! Chain slots past the structure's chain count are null. Structures with more
//! than [`MAX_COMPLEX_SIZE`] chains are rejected by [`extract_row`].

use crate::alphabet::UNK_TOKEN;
use crate::error::{DatasetError, DatasetResult};
use crate::record::StructureRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Number of per-chain columns in the metadata schema.
pub const MAX_COMPLEX_SIZE: usize = 32;

/// Columns that every row carries before the chain slots.
pub const BASE_COLUMNS: [&str; 4] = ["idcode", "num_res", "standard", "resolution"];

macro_rules! metadata_row {
    ($($slot:literal),* $(,)?) => {
        paste::paste! {
            /// One metadata row. See the [module docs](self) for the schema.
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct MetadataRow {
                pub idcode: String,
                pub num_res: u32,
                pub standard: bool,
                pub resolution: Option<f64>,
                $( pub [<num_res_ $slot>]: Option<u32>, )*
            }

            impl MetadataRow {
                /// Names of the per-chain columns, in slot order.
                pub const CHAIN_COLUMNS: [&'static str; MAX_COMPLEX_SIZE] =
                    [$( concat!("num_res_", $slot) ),*];

                /// A row with every chain slot unset.
                #[must_use]
                pub fn new(
                    idcode: impl Into<String>,
                    num_res: u32,
                    standard: bool,
                    resolution: Option<f64>,
                ) -> Self {
                    Self {
                        idcode: idcode.into(),
                        num_res,
                        standard,
                        resolution,
                        $( [<num_res_ $slot>]: None, )*
                    }
                }

                /// Residue count of chain slot `chain`; `None` when unset or out of range.
                #[must_use]
                pub const fn chain_residues(&self, chain: usize) -> Option<u32> {
                    match chain {
                        $( $slot => self.[<num_res_ $slot>], )*
                        _ => None,
                    }
                }

                fn chain_slot_mut(&mut self, chain: usize) -> Option<&mut Option<u32>> {
                    match chain {
                        $( $slot => Some(&mut self.[<num_res_ $slot>]), )*
                        _ => None,
                    }
                }
            }
        }
    };
}

metadata_row!(
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27, 28, 29, 30, 31,
);

impl MetadataRow {
    /// Set the residue count of chain slot `chain`.
    ///
    /// # Errors
    /// Returns [`DatasetError::Schema`] when `chain >= MAX_COMPLEX_SIZE`.
    pub fn set_chain_residues(&mut self, chain: usize, count: Option<u32>) -> DatasetResult<()> {
        let idcode = self.idcode.clone();
        let slot = self.chain_slot_mut(chain).ok_or_else(|| {
            DatasetError::schema(format!(
                "{idcode}: chain {chain} exceeds the maximum complex size of {MAX_COMPLEX_SIZE}"
            ))
        })?;
        *slot = count;
        Ok(())
    }

    /// Residue count of the primary chain (slot 0).
    #[inline]
    #[must_use]
    pub const fn primary_chain_len(&self) -> Option<u32> {
        self.num_res_0
    }

    /// Number of chain slots that are set.
    #[must_use]
    pub fn num_chains(&self) -> usize {
        (0..MAX_COMPLEX_SIZE)
            .filter(|&c| self.chain_residues(c).is_some())
            .count()
    }

    /// All column names, in schema order.
    #[must_use]
    pub fn columns() -> Vec<&'static str> {
        BASE_COLUMNS
            .iter()
            .chain(Self::CHAIN_COLUMNS.iter())
            .copied()
            .collect()
    }
}

/// Derive the metadata row for one record.
///
/// Pure: the same record always yields the same row. Chain slots are filled for
/// every chain index from 0 up to the largest one present; an interior index
/// with no residues gets `Some(0)`.
///
/// # Errors
/// - [`DatasetError::Integrity`] if the record's per-residue arrays disagree in length
/// - [`DatasetError::Schema`] if a chain index is at or beyond [`MAX_COMPLEX_SIZE`]
pub fn extract_row(record: &StructureRecord) -> DatasetResult<MetadataRow> {
    record.validate()?;

    let num_res = u32::try_from(record.len()).map_err(|_| {
        DatasetError::integrity(format!("{}: {} residues", record.idcode, record.len()))
    })?;
    let standard = !record.residue_token.iter().all(|&t| t == UNK_TOKEN);

    let mut counts = [0u32; MAX_COMPLEX_SIZE];
    let mut top: Option<usize> = None;
    for &chain in &record.chain_token {
        let chain = chain as usize;
        if chain >= MAX_COMPLEX_SIZE {
            return Err(DatasetError::schema(format!(
                "{}: chain {chain} exceeds the maximum complex size of {MAX_COMPLEX_SIZE}",
                record.idcode
            )));
        }
        counts[chain] += 1;
        top = Some(top.map_or(chain, |t| t.max(chain)));
    }

    let mut row = MetadataRow::new(record.idcode.clone(), num_res, standard, record.resolution);
    if let Some(top) = top {
        for (chain, &count) in counts.iter().enumerate().take(top + 1) {
            row.set_chain_residues(chain, Some(count))?;
        }
    }
    Ok(row)
}

/// Threshold predicates applied when a dataset view is constructed.
///
/// Absent thresholds impose no constraint. A row with a null value in a
/// constrained column never passes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowFilter {
    pub max_resolution: Option<f64>,
    /// Inclusive lower bound on the primary chain's residue count.
    pub min_sequence_length: Option<u32>,
    /// Inclusive upper bound on the primary chain's residue count.
    pub max_sequence_length: Option<u32>,
}

impl RowFilter {
    #[must_use]
    pub const fn with_max_resolution(mut self, resolution: f64) -> Self {
        self.max_resolution = Some(resolution);
        self
    }

    #[must_use]
    pub const fn with_min_sequence_length(mut self, len: u32) -> Self {
        self.min_sequence_length = Some(len);
        self
    }

    #[must_use]
    pub const fn with_max_sequence_length(mut self, len: u32) -> Self {
        self.max_sequence_length = Some(len);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.max_resolution.is_none()
            && self.min_sequence_length.is_none()
            && self.max_sequence_length.is_none()
    }

    #[must_use]
    pub fn accepts(&self, row: &MetadataRow) -> bool {
        if let Some(max) = self.max_resolution
            && !row.resolution.is_some_and(|r| r <= max)
        {
            return false;
        }
        if let Some(min) = self.min_sequence_length
            && !row.primary_chain_len().is_some_and(|n| n >= min)
        {
            return false;
        }
        if let Some(max) = self.max_sequence_length
            && !row.primary_chain_len().is_some_and(|n| n <= max)
        {
            return false;
        }
        true
    }
}

/// Ordered collection of metadata rows with unique identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    rows: Vec<MetadataRow>,
}

impl MetadataTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a table, collapsing duplicate identifiers.
    ///
    /// A duplicate keeps the position of its first occurrence and the values of
    /// its last one.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = MetadataRow>) -> Self {
        let mut out: Vec<MetadataRow> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for row in rows {
            if let Some(&pos) = positions.get(&row.idcode) {
                warn!(idcode = %row.idcode, "duplicate metadata row, keeping the latest");
                out[pos] = row;
            } else {
                positions.insert(row.idcode.clone(), out.len());
                out.push(row);
            }
        }
        Self { rows: out }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MetadataRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<MetadataRow> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetadataRow> {
        self.rows.iter()
    }

    #[must_use]
    pub fn contains(&self, idcode: &str) -> bool {
        self.rows.iter().any(|r| r.idcode == idcode)
    }

    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.idcode.as_str()).collect()
    }

    /// Union with `other`; rows from `other` replace rows with the same identifier.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self::from_rows(self.rows.into_iter().chain(other.rows))
    }

    /// Keep only the rows accepted by `filter`, preserving order.
    #[must_use]
    pub fn filter(self, filter: &RowFilter) -> Self {
        if filter.is_empty() {
            return self;
        }
        Self {
            rows: self.rows.into_iter().filter(|r| filter.accepts(r)).collect(),
        }
    }

    /// Permute rows into a random order. A seed makes the order reproducible.
    pub fn shuffle(&mut self, seed: Option<u64>) {
        match seed {
            Some(seed) => self.rows.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => self.rows.shuffle(&mut rand::thread_rng()),
        }
    }
}

impl FromIterator<MetadataRow> for MetadataTable {
    fn from_iter<I: IntoIterator<Item = MetadataRow>>(iter: I) -> Self {
        Self::from_rows(iter)
    }
}

impl<'a> IntoIterator for &'a MetadataTable {
    type Item = &'a MetadataRow;
    type IntoIter = std::slice::Iter<'a, MetadataRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
