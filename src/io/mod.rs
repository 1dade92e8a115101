//! File formats used by the record store.
//!
//! - [`compression`]: pluggable codecs, detected from extension or magic bytes
//! - [`json`]: single-document and JSON-lines Serde I/O
//! - [`ids`]: identifier list files
//! - [`parquet`]: typed Parquet tables (feature `io-parquet`)
//! - [`csv`]: typed CSV tables (feature `io-csv`)

pub mod compression;
pub mod ids;
pub mod json;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;

#[cfg_attr(docsrs, doc(cfg(feature = "io-parquet")))]
#[cfg(feature = "io-parquet")]
pub mod parquet;

use anyhow::{Context, Result};
use std::fs::create_dir_all;
use std::path::Path;

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    Ok(())
}
