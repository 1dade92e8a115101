//! # Foldset
//!
//! A **protein structure dataset builder** for machine-learning pipelines.
//! Foldset fetches structures from a [`RecordSource`], stores each one as a
//! tensor-ready [`StructureRecord`], and indexes them in a fixed-shape
//! [`MetadataTable`] that a [`ProteinDataset`] filters, shuffles, and serves
//! by position.
//!
//! ## Key Features
//!
//! - **Batch builds** - fetch thousands of identifiers sequentially or on a rayon pool
//! - **Skip, don't fail** - unavailable, malformed, or empty structures are logged and left out
//! - **Cooperative cancellation** - stop a running build from another thread
//! - **Fixed-shape metadata** - one row per structure with 32 per-chain residue columns
//! - **Filtering** - by resolution and primary-chain length, applied at load time
//! - **Reproducible order** - seeded shuffles yield the same ordering every time
//! - **Compressed storage** - records stored as gzip or zstd JSON (optional via feature flags)
//! - **Table formats** - Parquet (feature `io-parquet`) and CSV export (feature `io-csv`)
//!
//! ## Quick Start
//!
//! ```ignore
//! use foldset::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // A directory of previously downloaded structures
//! let source = LocalMirrorSource::new("/data/mirror");
//!
//! let config = BuildConfig::default()
//!     .with_identifiers(["1A3N", "2HHB", "4HHB"])
//!     .with_save_path("/data/foldset")
//!     .with_concurrency(8);
//!
//! let report = BuildPipeline::new(source, config).run()?;
//! println!("{} fetched, {} skipped", report.fetched(), report.skipped.len());
//!
//! // Reopen later, keeping only high-resolution structures
//! let dataset = ProteinDataset::new(
//!     "/data/foldset",
//!     DatasetOptions::default()
//!         .with_max_resolution(2.5)
//!         .with_seed(7),
//! )?;
//! for i in 0..dataset.len() {
//!     let record = dataset.get(i)?;
//!     println!("{} {}", record.idcode, record.sequence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`StructureRecord`] is the per-residue representation of one structure:
//! residue and chain tokens, and 14 atom slots per residue with coordinates and
//! presence masks. See [`alphabet`] for the token vocabulary.
//!
//! ### Metadata
//!
//! [`extract_row`] summarises a record into a [`MetadataRow`]. Tables are
//! deduplicated by identifier and persisted next to the records as
//! [`METADATA_FILENAME`].
//!
//! ### Building
//!
//! [`BuildPipeline`] runs fetch-and-extract per identifier. Failures become
//! [`SkipReason`]s in the [`BuildReport`]; only cancellation aborts the run.
//!
//! ### Datasets
//!
//! [`ProteinDataset`] is a read-only view: row `i` of the (filtered, shuffled)
//! table maps to a record loaded from disk, optionally passed through a
//! [`ProteinTransform`] and narrowed to an [`AttrSelection`].
//!
//! ## Feature Flags
//!
//! - `io-csv` - CSV export of metadata tables
//! - `io-parquet` - Parquet metadata tables (JSON lines otherwise)
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`, `compression-xz` - record codecs
//! - `metrics` - build counters and timing via [`metrics::MetricsCollector`]
//! - `progress` - per-identifier build progress bar (`BuildConfig::with_progress`)
//!
//! ## Module Overview
//!
//! - [`build`] - build pipeline and configuration
//! - [`dataset`] - dataset view and options
//! - [`metadata`] - row schema, extraction, filtering
//! - [`record`] - the structure record type
//! - [`source`] - record sources
//! - [`store`] - on-disk layout
//! - [`io`] - file formats and codecs
//! - [`testing`] - fixtures and a scriptable source

pub mod alphabet;
pub mod attrs;
pub mod build;
pub mod cancel;
pub mod dataset;
pub mod error;
pub mod io;
pub mod metadata;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod record;
pub mod source;
pub mod store;
pub mod testing;
pub mod transform;

// General re-exports
pub use alphabet::{PAD_TOKEN, UNK_TOKEN};
pub use attrs::{AttrSelection, ProteinAttr};
pub use build::{BuildConfig, BuildPipeline, BuildReport, build_table, default_identifiers};
pub use cancel::CancellationToken;
pub use dataset::{DatasetOptions, ProteinDataset};
pub use error::{DatasetError, DatasetResult, FetchError, SkipReason};
pub use metadata::{MAX_COMPLEX_SIZE, MetadataRow, MetadataTable, RowFilter, extract_row};
pub use record::{ATOMS_PER_RESIDUE, StructureRecord};
pub use source::{LocalMirrorSource, RecordSource};
pub use store::{METADATA_FILENAME, RecordFormat, RecordStore};
pub use transform::{Compose, ProteinTransform, SelectChain, TruncateResidues};

// Gated re-exports
#[cfg(feature = "metrics")]
pub use metrics::MetricsCollector;
#[cfg(feature = "progress")]
pub use build::default_progress_bar;
