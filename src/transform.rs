//! Transforms applied to records on retrieval.

use crate::record::StructureRecord;
use std::sync::Arc;

/// A pure record-to-record transform applied by
/// [`ProteinDataset::get`](crate::ProteinDataset::get).
///
/// Implementations must be `Send + Sync` so one dataset can be read from
/// several threads.
pub trait ProteinTransform: Send + Sync {
    fn transform(&self, record: StructureRecord) -> StructureRecord;
}

impl<F> ProteinTransform for F
where
    F: Fn(StructureRecord) -> StructureRecord + Send + Sync,
{
    fn transform(&self, record: StructureRecord) -> StructureRecord {
        self(record)
    }
}

/// Apply transforms in order.
#[derive(Clone, Default)]
pub struct Compose {
    steps: Vec<Arc<dyn ProteinTransform>>,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, step: impl ProteinTransform + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }
}

impl ProteinTransform for Compose {
    fn transform(&self, record: StructureRecord) -> StructureRecord {
        self.steps.iter().fold(record, |r, step| step.transform(r))
    }
}

/// Keep at most the first `max_len` residues.
#[derive(Debug, Clone, Copy)]
pub struct TruncateResidues {
    pub max_len: usize,
}

impl TruncateResidues {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl ProteinTransform for TruncateResidues {
    fn transform(&self, mut record: StructureRecord) -> StructureRecord {
        if record.len() <= self.max_len {
            return record;
        }
        let n = self.max_len;
        record.sequence = record.sequence.chars().take(n).collect();
        record.residue_token.truncate(n);
        record.residue_index.truncate(n);
        record.residue_mask.truncate(n);
        record.chain_token.truncate(n);
        record.atom_token.truncate(n);
        record.atom_coord.truncate(n);
        record.atom_mask.truncate(n);
        record
    }
}

/// Keep only the residues of one chain, renumbered as chain 0.
#[derive(Debug, Clone, Copy)]
pub struct SelectChain {
    pub chain: u32,
}

impl ProteinTransform for SelectChain {
    fn transform(&self, record: StructureRecord) -> StructureRecord {
        let keep: Vec<bool> = record.chain_token.iter().map(|&c| c == self.chain).collect();
        let pick = |i: usize| keep.get(i).copied().unwrap_or(false);
        StructureRecord {
            idcode: record.idcode,
            resolution: record.resolution,
            sequence: record
                .sequence
                .chars()
                .enumerate()
                .filter(|(i, _)| pick(*i))
                .map(|(_, c)| c)
                .collect(),
            residue_token: retain(record.residue_token, &keep),
            residue_index: retain(record.residue_index, &keep),
            residue_mask: retain(record.residue_mask, &keep),
            chain_token: vec![0; keep.iter().filter(|k| **k).count()],
            atom_token: retain(record.atom_token, &keep),
            atom_coord: retain(record.atom_coord, &keep),
            atom_mask: retain(record.atom_mask, &keep),
        }
    }
}

fn retain<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(v, k)| k.then_some(v))
        .collect()
}
