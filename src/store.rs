//! On-disk layout of a dataset directory.
//!
//! ```text
//! <base>/
//!   metadata.parquet        # the metadata table (metadata.jsonl without `io-parquet`)
//!   1ABC.json.gz            # one record per identifier
//!   2XYZ.json.gz
//! ```

use crate::error::{DatasetError, DatasetResult};
use crate::io::{compression, json};
use crate::metadata::{MetadataRow, MetadataTable};
use crate::record::StructureRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the persisted metadata table inside a dataset directory.
#[cfg(feature = "io-parquet")]
pub const METADATA_FILENAME: &str = "metadata.parquet";

/// File name of the persisted metadata table inside a dataset directory.
#[cfg(not(feature = "io-parquet"))]
pub const METADATA_FILENAME: &str = "metadata.jsonl";

/// Encoding of stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFormat {
    Json,
    JsonGzip,
    JsonZstd,
}

impl RecordFormat {
    pub const ALL: [Self; 3] = [Self::JsonGzip, Self::JsonZstd, Self::Json];

    /// File suffix, without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonGzip => "json.gz",
            Self::JsonZstd => "json.zst",
        }
    }

    /// Whether the codec this format needs is compiled in.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Json => true,
            Self::JsonGzip => compression::is_available("gzip"),
            Self::JsonZstd => compression::is_available("zstd"),
        }
    }
}

impl Default for RecordFormat {
    fn default() -> Self {
        if cfg!(feature = "compression-gzip") {
            Self::JsonGzip
        } else {
            Self::Json
        }
    }
}

/// Load and save records and the metadata table under a base directory.
///
/// The store holds no open handles; every call opens its own file, so a shared
/// `&RecordStore` is safe to use from many threads at once.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base: PathBuf,
    format: RecordFormat,
}

impl RecordStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            format: RecordFormat::default(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub const fn format(&self) -> RecordFormat {
        self.format
    }

    /// Path a record is saved to in this store's format.
    #[must_use]
    pub fn record_path(&self, idcode: &str) -> PathBuf {
        self.base.join(format!("{idcode}.{}", self.format.extension()))
    }

    /// First existing file for `idcode`, preferring this store's format.
    #[must_use]
    pub fn locate(&self, idcode: &str) -> Option<PathBuf> {
        std::iter::once(self.format)
            .chain(RecordFormat::ALL.into_iter().filter(|f| *f != self.format))
            .map(|f| self.base.join(format!("{idcode}.{}", f.extension())))
            .find(|p| p.is_file())
    }

    #[must_use]
    pub fn contains(&self, idcode: &str) -> bool {
        self.locate(idcode).is_some()
    }

    /// Persist `record`; returns the written path.
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the file cannot be written.
    pub fn save(&self, record: &StructureRecord) -> DatasetResult<PathBuf> {
        let path = self.record_path(&record.idcode);
        json::write_json(&path, record).map_err(|e| DatasetError::storage(&path, &e))?;
        debug!(idcode = %record.idcode, path = %path.display(), "saved record");
        Ok(path)
    }

    /// Load the record stored for `idcode`.
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if no file exists for `idcode`, the
    /// file cannot be decoded, or the decoded record is internally inconsistent.
    pub fn load(&self, idcode: &str) -> DatasetResult<StructureRecord> {
        let Some(path) = self.locate(idcode) else {
            return Err(DatasetError::Storage {
                path: self.record_path(idcode),
                message: format!("no stored record for {idcode}"),
            });
        };
        let record: StructureRecord =
            json::read_json(&path).map_err(|e| DatasetError::storage(&path, &e))?;
        if let Err(e) = record.validate() {
            return Err(DatasetError::Storage {
                path,
                message: format!("corrupt record: {e}"),
            });
        }
        Ok(record)
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.base.join(METADATA_FILENAME)
    }

    /// Persist the metadata table under [`METADATA_FILENAME`].
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the table cannot be written.
    pub fn save_table(&self, table: &MetadataTable) -> DatasetResult<PathBuf> {
        let path = self.metadata_path();
        write_table(&path, table.rows()).map_err(|e| DatasetError::storage(&path, &e))?;
        debug!(rows = table.len(), path = %path.display(), "saved metadata table");
        Ok(path)
    }

    /// Load the table saved by [`save_table`](Self::save_table).
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the table is missing or unreadable.
    pub fn load_table(&self) -> DatasetResult<MetadataTable> {
        let path = self.metadata_path();
        let rows = read_table(&path).map_err(|e| DatasetError::storage(&path, &e))?;
        Ok(MetadataTable::from_rows(rows))
    }
}

#[cfg(feature = "io-parquet")]
fn write_table(path: &Path, rows: &[MetadataRow]) -> anyhow::Result<usize> {
    crate::io::parquet::write_parquet_vec(path, rows)
}

#[cfg(feature = "io-parquet")]
fn read_table(path: &Path) -> anyhow::Result<Vec<MetadataRow>> {
    crate::io::parquet::read_parquet_vec(path)
}

#[cfg(not(feature = "io-parquet"))]
fn write_table(path: &Path, rows: &[MetadataRow]) -> anyhow::Result<usize> {
    json::write_jsonl_vec(path, rows)
}

#[cfg(not(feature = "io-parquet"))]
fn read_table(path: &Path) -> anyhow::Result<Vec<MetadataRow>> {
    json::read_jsonl_vec(path)
}

#[cfg(feature = "io-csv")]
impl MetadataTable {
    /// Export the table as CSV with the fixed column header.
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the file cannot be written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> DatasetResult<usize> {
        let path = path.as_ref();
        crate::io::csv::write_csv_vec(path, &MetadataRow::columns(), self.rows())
            .map_err(|e| DatasetError::storage(path, &e))
    }

    /// Import a table written by [`write_csv`](Self::write_csv).
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the file is missing or malformed.
    pub fn read_csv(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref();
        let rows: Vec<MetadataRow> =
            crate::io::csv::read_csv_vec(path).map_err(|e| DatasetError::storage(path, &e))?;
        Ok(Self::from_rows(rows))
    }
}
