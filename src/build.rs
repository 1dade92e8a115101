//! Build pipeline: fetch many identifiers, extract metadata, persist the table.
//!
//! Each identifier is an independent unit of work (fetch, then extract). A unit
//! either yields a [`MetadataRow`] or a [`SkipReason`]; skips are logged and
//! reported but never abort the batch. The only thing that stops a build is a
//! cancelled [`CancellationToken`]: workers check it before each fetch and the
//! run returns [`DatasetError::Cancelled`]. Records saved before that point stay
//! on disk; the partial table is discarded.
//!
//! With `concurrency > 1` units run on a dedicated rayon pool of that size.
//! Workers share nothing mutable: each returns its outcome and the outcomes are
//! merged into the table after the pool finishes, in submission order.

use crate::cancel::CancellationToken;
use crate::dataset::{DatasetOptions, ProteinDataset};
use crate::error::{DatasetError, DatasetResult, FetchError, SkipReason};
use crate::io::ids::{parse_identifiers, read_identifiers};
use crate::metadata::{MetadataRow, MetadataTable, extract_row};
#[cfg(feature = "metrics")]
use crate::metrics::MetricsCollector;
use crate::source::RecordSource;
use crate::store::{RecordFormat, RecordStore};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const BUNDLED_IDENTIFIERS: &str = include_str!("../data/pids_all.txt");

/// The identifier list compiled into the crate, used when a build is given
/// neither identifiers nor a list file. Parsed on each call.
#[must_use]
pub fn default_identifiers() -> Vec<String> {
    parse_identifiers(BUNDLED_IDENTIFIERS)
}

/// Bar ticking once per identifier, drawn to stderr.
#[cfg(feature = "progress")]
#[must_use]
pub fn default_progress_bar() -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(0);
    if let Ok(style) = indicatif::ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta})",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    pb
}

/// Settings for a [`BuildPipeline`] run.
#[derive(Clone)]
pub struct BuildConfig {
    /// Identifiers to build. `None` reads [`identifier_list`](Self::identifier_list).
    pub identifiers: Option<Vec<String>>,
    /// List file consulted when `identifiers` is `None`; read at run time.
    /// `None` uses [`default_identifiers`].
    pub identifier_list: Option<PathBuf>,
    /// Dataset directory. `None` uses the system temp directory.
    pub save_path: Option<PathBuf>,
    /// Worker count; `0` and `1` both mean sequential.
    pub concurrency: usize,
    /// Persist the metadata table after the run.
    pub save_table: bool,
    /// Format of the records the dataset view reads back.
    pub record_format: RecordFormat,
    pub cancel: CancellationToken,
    #[cfg(feature = "metrics")]
    pub metrics: Option<MetricsCollector>,
    /// Ticked once per finished identifier; its length is set when the run starts.
    #[cfg(feature = "progress")]
    pub progress: Option<indicatif::ProgressBar>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            identifiers: None,
            identifier_list: None,
            save_path: None,
            concurrency: 1,
            save_table: true,
            record_format: RecordFormat::default(),
            cancel: CancellationToken::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
            #[cfg(feature = "progress")]
            progress: None,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub fn with_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifiers = Some(identifiers.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_identifier_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.identifier_list = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    /// One worker per logical CPU.
    #[must_use]
    pub fn with_all_cores(self) -> Self {
        self.with_concurrency(num_cpus::get())
    }

    #[must_use]
    pub const fn with_save_table(mut self, save: bool) -> Self {
        self.save_table = save;
        self
    }

    #[must_use]
    pub const fn with_record_format(mut self, format: RecordFormat) -> Self {
        self.record_format = format;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Show a [`default_progress_bar`] while building.
    #[cfg(feature = "progress")]
    #[must_use]
    pub fn with_progress(self) -> Self {
        self.with_progress_bar(default_progress_bar())
    }

    #[cfg(feature = "progress")]
    #[must_use]
    pub fn with_progress_bar(mut self, bar: indicatif::ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Identifiers for this run: the explicit list, else the list file, else
    /// the bundled list.
    ///
    /// # Errors
    /// Returns [`DatasetError::Storage`] if the list file cannot be read.
    pub fn resolve_identifiers(&self) -> DatasetResult<Vec<String>> {
        if let Some(ids) = &self.identifiers {
            return Ok(ids.clone());
        }
        match &self.identifier_list {
            Some(path) => read_identifiers(path).map_err(|e| DatasetError::storage(path, &e)),
            None => Ok(default_identifiers()),
        }
    }

    #[must_use]
    pub fn resolve_save_path(&self) -> PathBuf {
        self.save_path.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub table: MetadataTable,
    /// Identifiers left out, with the reason, in submission order.
    pub skipped: Vec<(String, SkipReason)>,
    pub save_path: PathBuf,
    pub elapsed: Duration,
}

impl BuildReport {
    /// Number of identifiers that made it into the table.
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.table.len()
    }
}

enum Outcome {
    Fetched(MetadataRow),
    Skipped(String, SkipReason),
}

/// Fetch-and-extract over many identifiers from one [`RecordSource`].
pub struct BuildPipeline<S> {
    source: S,
    config: BuildConfig,
}

impl<S: RecordSource> BuildPipeline<S> {
    pub const fn new(source: S, config: BuildConfig) -> Self {
        Self { source, config }
    }

    #[must_use]
    pub const fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Run the build.
    ///
    /// # Errors
    /// - [`DatasetError::Cancelled`] if the cancellation token fired
    /// - [`DatasetError::Storage`] if the identifier list, the dataset
    ///   directory, or the table cannot be read or written
    /// - [`DatasetError::Config`] if the worker pool cannot be created
    ///
    /// Per-identifier failures are not errors; they appear in
    /// [`BuildReport::skipped`].
    pub fn run(&self) -> DatasetResult<BuildReport> {
        let started = Instant::now();
        let identifiers = self.config.resolve_identifiers()?;
        let save_path = self.config.resolve_save_path();
        std::fs::create_dir_all(&save_path).map_err(|e| DatasetError::Storage {
            path: save_path.clone(),
            message: format!("mkdir -p: {e}"),
        })?;

        #[cfg(feature = "metrics")]
        if let Some(m) = &self.config.metrics {
            m.record_start();
        }
        info!(
            identifiers = identifiers.len(),
            workers = self.config.concurrency.max(1),
            path = %save_path.display(),
            "building dataset"
        );
        #[cfg(feature = "progress")]
        if let Some(pb) = &self.config.progress {
            pb.set_length(identifiers.len() as u64);
            pb.set_position(0);
        }

        let outcomes = if self.config.concurrency > 1 {
            self.run_parallel(&identifiers, &save_path)
        } else {
            self.run_sequential(&identifiers, &save_path)
        };
        let outcomes = match outcomes {
            Ok(outcomes) => outcomes,
            Err(e) => {
                if matches!(e, DatasetError::Cancelled) {
                    warn!("build cancelled, discarding partial table");
                }
                #[cfg(feature = "progress")]
                if let Some(pb) = &self.config.progress {
                    pb.abandon();
                }
                #[cfg(feature = "metrics")]
                if let Some(m) = &self.config.metrics {
                    m.record_end();
                }
                return Err(e);
            }
        };

        #[cfg(feature = "progress")]
        if let Some(pb) = &self.config.progress {
            pb.finish();
        }

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Fetched(row) => rows.push(row),
                Outcome::Skipped(idcode, reason) => skipped.push((idcode, reason)),
            }
        }
        let table = MetadataTable::from_rows(rows);

        if self.config.save_table {
            RecordStore::new(&save_path)
                .with_format(self.config.record_format)
                .save_table(&table)?;
        }

        #[cfg(feature = "metrics")]
        if let Some(m) = &self.config.metrics {
            record_metrics(m, identifiers.len(), &table, &skipped);
            m.record_end();
        }

        let elapsed = started.elapsed();
        info!(
            fetched = table.len(),
            skipped = skipped.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "build finished"
        );
        Ok(BuildReport {
            table,
            skipped,
            save_path,
            elapsed,
        })
    }

    /// Run the build and open a dataset view over the fresh table.
    ///
    /// `options.metadata` is replaced by the built table; every other option
    /// (filters, transform, attributes, seed) applies as given.
    ///
    /// # Errors
    /// Any error of [`run`](Self::run) or [`ProteinDataset::new`].
    pub fn build_dataset(&self, options: DatasetOptions) -> DatasetResult<ProteinDataset> {
        let report = self.run()?;
        ProteinDataset::new(
            &report.save_path,
            DatasetOptions {
                metadata: Some(report.table),
                record_format: self.config.record_format,
                ..options
            },
        )
    }

    fn run_sequential(&self, identifiers: &[String], dest: &Path) -> DatasetResult<Vec<Outcome>> {
        identifiers.iter().map(|id| self.step(id, dest)).collect()
    }

    fn run_parallel(&self, identifiers: &[String], dest: &Path) -> DatasetResult<Vec<Outcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency)
            .thread_name(|i| format!("foldset-build-{i}"))
            .build()
            .map_err(|e| DatasetError::Config(format!("build worker pool: {e}")))?;
        pool.install(|| {
            identifiers
                .par_iter()
                .map(|id| self.step(id, dest))
                .collect()
        })
    }

    fn step(&self, idcode: &str, dest: &Path) -> DatasetResult<Outcome> {
        let outcome = self.process(idcode, dest);
        #[cfg(feature = "progress")]
        if outcome.is_ok()
            && let Some(pb) = &self.config.progress
        {
            pb.inc(1);
        }
        outcome
    }

    /// One unit of work. `Err` only for cancellation.
    fn process(&self, idcode: &str, dest: &Path) -> DatasetResult<Outcome> {
        self.config.cancel.check()?;

        let record = match self.source.fetch(idcode, dest) {
            Ok(record) => record,
            Err(FetchError::Cancelled) => return Err(DatasetError::Cancelled),
            Err(FetchError::Request { message, .. }) => {
                return Ok(skip(idcode, SkipReason::Request(message)));
            }
            Err(FetchError::Content { message, .. }) => {
                return Ok(skip(idcode, SkipReason::Content(message)));
            }
        };
        if record.is_empty() {
            return Ok(skip(idcode, SkipReason::EmptySequence));
        }

        match extract_row(&record) {
            Ok(row) => {
                debug!(idcode, residues = row.num_res, chains = row.num_chains(), "extracted");
                Ok(Outcome::Fetched(row))
            }
            Err(DatasetError::Schema(msg)) => Ok(skip(idcode, SkipReason::Schema(msg))),
            Err(DatasetError::Integrity(msg)) => Ok(skip(idcode, SkipReason::Content(msg))),
            Err(e) => Err(e),
        }
    }
}

fn skip(idcode: &str, reason: SkipReason) -> Outcome {
    warn!(idcode, reason = %reason, "skipping identifier");
    Outcome::Skipped(idcode.to_string(), reason)
}

#[cfg(feature = "metrics")]
#[allow(clippy::cast_precision_loss)]
fn record_metrics(
    metrics: &MetricsCollector,
    requested: usize,
    table: &MetadataTable,
    skipped: &[(String, SkipReason)],
) {
    metrics.increment_counter("records_requested", requested as u64);
    metrics.increment_counter("records_fetched", table.len() as u64);
    metrics.increment_counter("records_skipped", skipped.len() as u64);
    for (_, reason) in skipped {
        metrics.increment_counter(&format!("records_skipped_{}", reason.label()), 1);
    }
    for row in table {
        metrics.record_value("residues_per_record", f64::from(row.num_res));
    }
}

/// Build a table over `identifiers` with `concurrency` workers, persisting
/// records and the table under `storage_path`.
///
/// # Errors
/// See [`BuildPipeline::run`].
pub fn build_table<S: RecordSource>(
    source: S,
    identifiers: Vec<String>,
    concurrency: usize,
    storage_path: impl Into<PathBuf>,
) -> DatasetResult<MetadataTable> {
    let config = BuildConfig::default()
        .with_identifiers(identifiers)
        .with_concurrency(concurrency)
        .with_save_path(storage_path);
    BuildPipeline::new(source, config).run().map(|r| r.table)
}
