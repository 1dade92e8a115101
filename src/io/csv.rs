//! Typed CSV tables via Serde.
//!
//! `None` fields are written as empty cells and read back as `None`.

use super::compression::{FinishWrite, auto_detect_reader, auto_detect_writer};
use super::ensure_parent;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

/// Read a headed CSV file into `Vec<T>`.
///
/// # Errors
/// Returns an error naming the record number of the first row that fails to
/// deserialize.
pub fn read_csv_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(rdr);
    let mut out = Vec::<T>::new();
    for (i, rec) in rdr.deserialize::<T>().enumerate() {
        let v = rec.with_context(|| format!("parse CSV record #{} in {}", i + 1, path.display()))?;
        out.push(v);
    }
    Ok(out)
}

/// Write `rows` as a headed CSV file; returns the row count.
///
/// The header is taken from `header` so an empty table still gets one.
///
/// # Errors
/// Returns an error if the file cannot be created or any row fails to serialize.
pub fn write_csv_vec<T: Serialize>(
    path: impl AsRef<Path>,
    header: &[&str],
    rows: &[T],
) -> Result<usize> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(header).context("write CSV header")?;
    for (i, row) in rows.iter().enumerate() {
        wtr.serialize(row)
            .with_context(|| format!("serialize CSV row #{}", i + 1))?;
    }
    let w = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush CSV writer for {}: {}", path.display(), e.error()))?;
    w.finish_stream()
        .with_context(|| format!("finish {}", path.display()))?;
    Ok(rows.len())
}
