//! Error taxonomy for building and reading protein datasets.
//!
//! Two layers are kept apart:
//! - [`FetchError`] is what a [`RecordSource`](crate::source::RecordSource) reports for a
//!   single identifier. The build pipeline turns request and content failures into a
//!   [`SkipReason`] and carries on; only [`FetchError::Cancelled`] escapes.
//! - [`DatasetError`] is what callers see. Everything except the skip reasons ends up here.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Failure of a single fetch from a record source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote (or mirror) request failed; usually transient.
    #[error("request for {idcode} failed: {message}")]
    Request { idcode: String, message: String },

    /// The fetched payload could not be turned into a record.
    #[error("malformed content for {idcode}: {message}")]
    Content { idcode: String, message: String },

    /// The user asked the build to stop.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn request(idcode: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            idcode: idcode.into(),
            message: message.into(),
        }
    }

    pub fn content(idcode: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Content {
            idcode: idcode.into(),
            message: message.into(),
        }
    }
}

/// Why an identifier was left out of a built table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Network or remote request failure.
    Request(String),
    /// Malformed content, or a record that violates its own length invariants.
    Content(String),
    /// The record parsed but holds no residues.
    EmptySequence,
    /// The record does not fit the fixed metadata schema (too many chains).
    Schema(String),
}

impl SkipReason {
    /// Short stable label, used for metric names and log fields.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Content(_) => "content",
            Self::EmptySequence => "empty",
            Self::Schema(_) => "schema",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "request failed: {msg}"),
            Self::Content(msg) => write!(f, "bad content: {msg}"),
            Self::EmptySequence => write!(f, "empty sequence"),
            Self::Schema(msg) => write!(f, "schema: {msg}"),
        }
    }
}

/// Errors surfaced to callers of the build pipeline and dataset views.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed content: {0}")]
    Content(String),

    #[error("operation cancelled")]
    Cancelled,

    /// Unknown attribute, or a record that exceeds the metadata schema.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("index {index} out of bounds for dataset of length {len}")]
    Bounds { index: usize, len: usize },

    /// Missing or unreadable persisted data.
    #[error("storage error at {}: {message}", path.display())]
    Storage { path: PathBuf, message: String },

    /// A record whose per-residue arrays disagree in length.
    #[error("data integrity violated: {0}")]
    Integrity(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DatasetError {
    #[must_use]
    pub fn schema(details: impl Into<String>) -> Self {
        Self::Schema(details.into())
    }

    #[must_use]
    pub fn integrity(details: impl Into<String>) -> Self {
        Self::Integrity(details.into())
    }

    /// Wrap a contextual I/O failure for `path`. The full `anyhow` chain is kept
    /// in the message.
    #[must_use]
    pub fn storage(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Storage {
            path: path.into(),
            message: format!("{err:#}"),
        }
    }
}

impl From<FetchError> for DatasetError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Request { idcode, message } => Self::Request(format!("{idcode}: {message}")),
            FetchError::Content { idcode, message } => Self::Content(format!("{idcode}: {message}")),
            FetchError::Cancelled => Self::Cancelled,
        }
    }
}
