//! Random-access dataset view over a metadata table and a record store.

use crate::attrs::AttrSelection;
use crate::error::{DatasetError, DatasetResult};
use crate::metadata::{MetadataRow, MetadataTable, RowFilter};
use crate::record::StructureRecord;
use crate::store::{RecordFormat, RecordStore};
use crate::transform::ProteinTransform;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Construction options for a [`ProteinDataset`].
#[derive(Clone, Default)]
pub struct DatasetOptions {
    /// Table to index. `None` loads the table persisted under the base path.
    pub metadata: Option<MetadataTable>,
    pub transform: Option<Arc<dyn ProteinTransform>>,
    /// Attribute allow-list by name. `None` selects every attribute.
    pub attrs: Option<Vec<String>>,
    pub filter: RowFilter,
    /// Seed for the row shuffle; `None` shuffles non-reproducibly.
    pub seed: Option<u64>,
    /// Preferred record encoding when reading back; other encodings are still found.
    pub record_format: RecordFormat,
}

impl DatasetOptions {
    #[must_use]
    pub fn with_metadata(mut self, table: MetadataTable) -> Self {
        self.metadata = Some(table);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: impl ProteinTransform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    #[must_use]
    pub fn with_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs = Some(attrs.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn with_max_resolution(mut self, resolution: f64) -> Self {
        self.filter.max_resolution = Some(resolution);
        self
    }

    #[must_use]
    pub const fn with_min_sequence_length(mut self, len: u32) -> Self {
        self.filter.min_sequence_length = Some(len);
        self
    }

    #[must_use]
    pub const fn with_max_sequence_length(mut self, len: u32) -> Self {
        self.filter.max_sequence_length = Some(len);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_record_format(mut self, format: RecordFormat) -> Self {
        self.record_format = format;
        self
    }
}

/// Filtered, shuffled view over a dataset directory.
///
/// Filters and the shuffle are applied once, in [`new`](Self::new); the row
/// order is fixed for the life of the view. The view is immutable, so
/// `get` may be called from several threads at once; each call loads its own
/// record from disk.
pub struct ProteinDataset {
    store: RecordStore,
    metadata: MetadataTable,
    transform: Option<Arc<dyn ProteinTransform>>,
    attrs: AttrSelection,
}

impl ProteinDataset {
    /// Open a view over the dataset directory `base_path`.
    ///
    /// Order of operations: take or load the table, apply the filters, shuffle,
    /// then validate the attribute allow-list.
    ///
    /// # Errors
    /// - [`DatasetError::Storage`] if no table is supplied and none can be loaded
    /// - [`DatasetError::Schema`] if an attribute name is not recognized
    pub fn new(base_path: impl Into<PathBuf>, options: DatasetOptions) -> DatasetResult<Self> {
        let store = RecordStore::new(base_path).with_format(options.record_format);
        let metadata = match options.metadata {
            Some(table) => table,
            None => store.load_table()?,
        };

        let total = metadata.len();
        let mut metadata = metadata.filter(&options.filter);
        debug!(total, kept = metadata.len(), filter = ?options.filter, "filtered metadata");
        metadata.shuffle(options.seed);

        let attrs = match options.attrs {
            Some(names) => AttrSelection::parse(names)?,
            None => AttrSelection::All,
        };

        Ok(Self {
            store,
            metadata,
            transform: options.transform,
            attrs,
        })
    }

    /// Open a view with default options: persisted table, no filters, all attributes.
    ///
    /// # Errors
    /// See [`new`](Self::new).
    pub fn open(base_path: impl Into<PathBuf>) -> DatasetResult<Self> {
        Self::new(base_path, DatasetOptions::default())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        self.store.base()
    }

    /// The active table, in view order.
    #[must_use]
    pub const fn metadata(&self) -> &MetadataTable {
        &self.metadata
    }

    #[must_use]
    pub const fn attrs(&self) -> &AttrSelection {
        &self.attrs
    }

    /// Metadata row at `index`.
    ///
    /// # Errors
    /// Returns [`DatasetError::Bounds`] if `index >= len()`.
    pub fn row(&self, index: usize) -> DatasetResult<&MetadataRow> {
        self.metadata.get(index).ok_or(DatasetError::Bounds {
            index,
            len: self.len(),
        })
    }

    /// Load the record at `index` and apply the transform, if any.
    ///
    /// # Errors
    /// - [`DatasetError::Bounds`] if `index >= len()`
    /// - [`DatasetError::Storage`] if the record file is missing, unreadable, or
    ///   holds an inconsistent record
    pub fn get(&self, index: usize) -> DatasetResult<StructureRecord> {
        let row = self.row(index)?;
        let record = self.store.load(&row.idcode)?;
        Ok(match &self.transform {
            Some(t) => t.transform(record),
            None => record,
        })
    }

    /// Like [`get`](Self::get), projected onto the selected attributes.
    ///
    /// # Errors
    /// See [`get`](Self::get).
    pub fn get_selected(&self, index: usize) -> DatasetResult<Map<String, Value>> {
        self.get(index)?.select(&self.attrs)
    }

    /// Every record in view order.
    pub fn iter(&self) -> impl Iterator<Item = DatasetResult<StructureRecord>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
