//! Cooperative cancellation for long-running builds.

use crate::error::FetchError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that a caller flips to stop a build.
///
/// Clones share the same flag, so a token handed to a signal handler or another
/// thread cancels every pipeline holding a clone. Workers check the flag before
/// each fetch; a fetch already in flight runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(FetchError::Cancelled)` once the token has been cancelled.
    ///
    /// # Errors
    /// Returns [`FetchError::Cancelled`] after [`cancel`](Self::cancel) was called on any clone.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    }
}
