//! Where build pipelines get their records from.
//!
//! A [`RecordSource`] turns an identifier into a parsed [`StructureRecord`] and
//! persists the raw record under the destination directory. Network clients
//! plug in by implementing the trait; [`LocalMirrorSource`] serves records from
//! a directory of previously stored ones.

use crate::error::FetchError;
use crate::record::StructureRecord;
use crate::store::{RecordFormat, RecordStore};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Fetch one structure record by identifier.
///
/// Implementations may retry transient failures internally; the pipeline
/// itself never retries. They must be shareable across build workers.
pub trait RecordSource: Send + Sync {
    /// Fetch `idcode`, persisting it under `destination` on success.
    ///
    /// # Errors
    /// - [`FetchError::Request`] for network / remote failures
    /// - [`FetchError::Content`] for malformed or unusable payloads
    /// - [`FetchError::Cancelled`] if the source observed a cancellation
    fn fetch(&self, idcode: &str, destination: &Path) -> Result<StructureRecord, FetchError>;
}

impl<F> RecordSource for F
where
    F: Fn(&str, &Path) -> Result<StructureRecord, FetchError> + Send + Sync,
{
    fn fetch(&self, idcode: &str, destination: &Path) -> Result<StructureRecord, FetchError> {
        self(idcode, destination)
    }
}

/// Serves records from a local mirror directory laid out like a dataset
/// directory (`<root>/<IDCODE>.json[.gz|.zst]`).
#[derive(Debug, Clone)]
pub struct LocalMirrorSource {
    mirror: RecordStore,
    format: RecordFormat,
}

impl LocalMirrorSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            mirror: RecordStore::new(root),
            format: RecordFormat::default(),
        }
    }

    /// Format used when copying records into the destination.
    #[must_use]
    pub const fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.mirror.base()
    }

    /// Identifiers with a stored record in the mirror, sorted.
    ///
    /// # Errors
    /// Returns an error if the mirror directory cannot be listed.
    pub fn available_identifiers(&self) -> anyhow::Result<Vec<String>> {
        let pattern = self.root().join("*.json*");
        let pattern = pattern.to_string_lossy();
        let mut ids: Vec<String> = glob::glob(&pattern)
            .with_context(|| format!("invalid mirror pattern {pattern}"))?
            .filter_map(Result::ok)
            .filter_map(|p| {
                let name = p.file_name()?.to_str()?;
                let (stem, _) = name.split_once('.')?;
                Some(stem.to_string())
            })
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

impl RecordSource for LocalMirrorSource {
    fn fetch(&self, idcode: &str, destination: &Path) -> Result<StructureRecord, FetchError> {
        if !self.mirror.contains(idcode) {
            return Err(FetchError::request(
                idcode,
                format!("not present in mirror {}", self.root().display()),
            ));
        }
        let record = self
            .mirror
            .load(idcode)
            .map_err(|e| FetchError::content(idcode, e.to_string()))?;

        let target = RecordStore::new(destination).with_format(self.format);
        if target.record_path(idcode) != self.mirror.locate(idcode).unwrap_or_default() {
            target
                .save(&record)
                .map_err(|e| FetchError::request(idcode, e.to_string()))?;
        }
        Ok(record)
    }
}
