//! Pre-built records and rows for tests.

use crate::alphabet::{ONE_LETTER, token_from_letter};
use crate::metadata::MetadataRow;
use crate::record::StructureRecord;
use crate::store::RecordStore;
use std::path::Path;

/// A consistent record with one chain per entry of `chain_lengths`.
///
/// Residues cycle through the twenty standard amino acids; atoms are laid out
/// on a line so coordinates differ per residue.
///
/// # Example
///
/// ```
/// use foldset::testing::record_fixture;
///
/// let record = record_fixture("1ABC", &[3, 2], Some(2.1));
/// assert_eq!(record.len(), 5);
/// assert_eq!(record.num_chains(), 2);
/// assert!(record.validate().is_ok());
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn record_fixture(idcode: &str, chain_lengths: &[usize], resolution: Option<f64>) -> StructureRecord {
    let standard = &ONE_LETTER[2..];
    let total: usize = chain_lengths.iter().sum();

    let mut record = StructureRecord {
        idcode: idcode.to_string(),
        resolution,
        sequence: String::with_capacity(total),
        residue_token: Vec::with_capacity(total),
        residue_index: Vec::with_capacity(total),
        residue_mask: Vec::with_capacity(total),
        chain_token: Vec::with_capacity(total),
        atom_token: Vec::with_capacity(total),
        atom_coord: Vec::with_capacity(total),
        atom_mask: Vec::with_capacity(total),
    };

    let mut i = 0usize;
    for (chain, &len) in chain_lengths.iter().enumerate() {
        for pos in 0..len {
            let letter = standard[i % standard.len()];
            let x = i as f32 * 3.8;
            record.sequence.push(letter);
            record.residue_token.push(token_from_letter(letter));
            record.residue_index.push(pos as i32 + 1);
            record.residue_mask.push(true);
            record.chain_token.push(chain as u32);
            record.atom_token.push(std::array::from_fn(|a| a as u8 + 1));
            record.atom_coord.push(std::array::from_fn(|a| [x, a as f32 * 0.5, 0.0]));
            record.atom_mask.push(std::array::from_fn(|a| a < 4));
            i += 1;
        }
    }
    record
}

/// A metadata row with a single primary chain of `primary_len` residues.
#[must_use]
pub fn metadata_row_fixture(idcode: &str, resolution: Option<f64>, primary_len: u32) -> MetadataRow {
    let mut row = MetadataRow::new(idcode, primary_len, true, resolution);
    row.num_res_0 = Some(primary_len);
    row
}

/// Save `records` into a mirror directory readable by
/// [`LocalMirrorSource`](crate::LocalMirrorSource).
///
/// # Errors
/// Returns an error if any record cannot be written.
pub fn write_mirror(root: &Path, records: &[StructureRecord]) -> anyhow::Result<()> {
    let store = RecordStore::new(root);
    for record in records {
        store.save(record)?;
    }
    Ok(())
}
