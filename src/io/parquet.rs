//! Typed Parquet tables via Serde + Arrow.
//!
//! The Arrow schema is traced from `T` itself (`SchemaLike::from_type`), so a
//! table with zero rows still carries every column. `Option` fields become
//! nullable columns.

use super::ensure_parent;
use anyhow::{Context, Result};
use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use serde_arrow::{from_record_batch, to_record_batch};
use std::fs::File;
use std::path::Path;

/// Rows per Parquet row group.
const ROW_GROUP_SIZE: usize = 16 * 1024;

/// Arrow fields traced from `T`.
///
/// # Errors
/// Returns an error if `T` has a shape `serde_arrow` cannot map.
pub fn schema_of<T: for<'de> Deserialize<'de>>() -> Result<Vec<FieldRef>> {
    Vec::<FieldRef>::from_type::<T>(TracingOptions::default())
        .context("infer Arrow schema from row type")
}

/// Write `rows` to a Parquet file (snappy-compressed); returns the row count.
///
/// # Errors
/// Returns an error if schema inference, batch conversion, or the write fails.
pub fn write_parquet_vec<T>(path: impl AsRef<Path>, rows: &[T]) -> Result<usize>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    ensure_parent(path)?;

    let fields = schema_of::<T>()?;
    let batch: RecordBatch =
        to_record_batch(&fields, &rows).context("convert rows to RecordBatch")?;

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(ROW_GROUP_SIZE)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).context("create ArrowWriter")?;
    writer.write(&batch).context("write batch to parquet")?;
    writer.close().context("close ArrowWriter")?;

    Ok(rows.len())
}

/// Read every row group of a Parquet file into `Vec<T>`.
///
/// # Errors
/// Returns an error if the file cannot be opened or a batch fails to
/// deserialize into `T`.
pub fn read_parquet_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("read parquet footer of {}", path.display()))?
        .with_batch_size(ROW_GROUP_SIZE)
        .build()
        .context("build ParquetRecordBatchReader")?;

    let mut out: Vec<T> = Vec::new();
    while let Some(batch) = reader.next().transpose().context("read next batch")? {
        let mut rows: Vec<T> =
            from_record_batch(&batch).context("deserialize RecordBatch rows")?;
        out.append(&mut rows);
    }
    Ok(out)
}
