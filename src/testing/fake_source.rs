//! In-memory [`RecordSource`] with scripted per-identifier outcomes.

use crate::cancel::CancellationToken;
use crate::error::FetchError;
use crate::record::StructureRecord;
use crate::source::RecordSource;
use crate::store::RecordStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What [`FakeRecordSource`] does for one identifier.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Record(StructureRecord),
    RequestError(String),
    ContentError(String),
    /// Cancel the token, then report [`FetchError::Cancelled`].
    Cancel(CancellationToken),
}

/// Scriptable record source.
///
/// Identifiers without a script fail with a request error ("not found").
/// Successful fetches are saved under the destination like a real source
/// would. Every call is logged so tests can assert which identifiers were
/// attempted.
#[derive(Debug, Default)]
pub struct FakeRecordSource {
    outcomes: HashMap<String, FakeOutcome>,
    calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl FakeRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(mut self, record: StructureRecord) -> Self {
        self.outcomes
            .insert(record.idcode.clone(), FakeOutcome::Record(record));
        self
    }

    #[must_use]
    pub fn with_records(self, records: impl IntoIterator<Item = StructureRecord>) -> Self {
        records.into_iter().fold(self, Self::with_record)
    }

    #[must_use]
    pub fn with_request_error(mut self, idcode: &str, message: &str) -> Self {
        self.outcomes
            .insert(idcode.to_string(), FakeOutcome::RequestError(message.to_string()));
        self
    }

    #[must_use]
    pub fn with_content_error(mut self, idcode: &str, message: &str) -> Self {
        self.outcomes
            .insert(idcode.to_string(), FakeOutcome::ContentError(message.to_string()));
        self
    }

    /// Fetching `idcode` cancels `token`.
    #[must_use]
    pub fn with_cancel_on(mut self, idcode: &str, token: CancellationToken) -> Self {
        self.outcomes
            .insert(idcode.to_string(), FakeOutcome::Cancel(token));
        self
    }

    /// Number of `fetch` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Identifiers passed to `fetch`, in call order.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn attempted(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl RecordSource for FakeRecordSource {
    fn fetch(&self, idcode: &str, destination: &Path) -> Result<StructureRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(idcode.to_string());

        match self.outcomes.get(idcode) {
            Some(FakeOutcome::Record(record)) => {
                RecordStore::new(destination)
                    .save(record)
                    .map_err(|e| FetchError::request(idcode, e.to_string()))?;
                Ok(record.clone())
            }
            Some(FakeOutcome::RequestError(msg)) => Err(FetchError::request(idcode, msg.clone())),
            Some(FakeOutcome::ContentError(msg)) => Err(FetchError::content(idcode, msg.clone())),
            Some(FakeOutcome::Cancel(token)) => {
                token.cancel();
                Err(FetchError::Cancelled)
            }
            None => Err(FetchError::request(idcode, "not found")),
        }
    }
}
