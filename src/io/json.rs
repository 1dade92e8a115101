//! Serde JSON I/O: one document per file, or one value per line.
//!
//! Both forms go through [`compression`](super::compression), so a `.gz` or
//! `.zst` suffix is enough to get a compressed file.

use super::compression::{FinishWrite, auto_detect_reader, auto_detect_writer};
use super::ensure_parent;
use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Read a single JSON document from `path`.
///
/// # Errors
/// Returns an error if the file cannot be opened or decompressed, or does not
/// deserialize into `T`.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    serde_json::from_reader(BufReader::new(rdr))
        .with_context(|| format!("parse JSON document {}", path.display()))
}

/// Write `value` as a single compact JSON document, creating parent directories.
///
/// # Errors
/// Returns an error if the file cannot be created or the value fails to serialize.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    serde_json::to_writer(&mut w, value)
        .with_context(|| format!("serialize JSON document to {}", path.display()))?;
    w.finish_stream()
        .with_context(|| format!("finish {}", path.display()))?;
    Ok(())
}

/// Read a JSON-lines file into a `Vec<T>`, skipping blank lines.
///
/// # Errors
/// Returns an error naming the line number of the first line that fails to parse.
pub fn read_jsonl_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut out = Vec::<T>::new();
    for (i, line) in BufReader::new(rdr).lines().enumerate() {
        let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let v: T = serde_json::from_str(&line)
            .with_context(|| format!("parse JSONL line {} in {}", i + 1, path.display()))?;
        out.push(v);
    }
    Ok(out)
}

/// Write `data` as JSON lines; returns the number of values written.
///
/// # Errors
/// Returns an error if the file cannot be created or any value fails to serialize.
pub fn write_jsonl_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    for (i, item) in data.iter().enumerate() {
        serde_json::to_writer(&mut w, item)
            .with_context(|| format!("serialize item #{} to {}", i, path.display()))?;
        w.write_all(b"\n")?;
    }
    w.finish_stream()
        .with_context(|| format!("finish {}", path.display()))?;
    Ok(data.len())
}
