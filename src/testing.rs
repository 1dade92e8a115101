//! Test helpers: record fixtures and a scriptable record source.
//!
//! ```
//! use foldset::testing::{FakeRecordSource, record_fixture};
//! use foldset::{BuildConfig, BuildPipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let tmp = tempfile::tempdir()?;
//! let source = FakeRecordSource::new()
//!     .with_record(record_fixture("1ABC", &[12, 8], Some(1.9)))
//!     .with_content_error("BAD", "truncated file");
//!
//! let config = BuildConfig::default()
//!     .with_identifiers(["1ABC", "BAD"])
//!     .with_save_path(tmp.path());
//! let report = BuildPipeline::new(source, config).run()?;
//! assert_eq!(report.table.len(), 1);
//! # Ok(())
//! # }
//! ```

mod fake_source;
mod fixtures;

pub use fake_source::{FakeOutcome, FakeRecordSource};
pub use fixtures::{metadata_row_fixture, record_fixture, write_mirror};
