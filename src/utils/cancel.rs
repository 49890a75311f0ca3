//! Cooperative cancellation of long batch runs.

use crate::error::Error;
use color_eyre::eyre::{Report, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something that can be asked to stop.
pub trait Cancellable {
    /// Check if cancellation has been requested.
    fn is_cancelled(&self) -> bool;

    /// Request cancellation.
    fn cancel(&self);

    /// Returns [`Error::Cancelled`] once cancellation has been requested.
    fn check(&self) -> Result<(), Report> {
        if self.is_cancelled() {
            return Err(Error::Cancelled.into());
        }
        Ok(())
    }
}

/// Cancellation flag shared between a caller and the workers of a run.
///
/// Clones observe the same flag.
///
/// ```rust
/// use lcenv::utils::{Cancellable, CancellationToken};
///
/// let token = CancellationToken::new();
/// let worker = token.clone();
/// assert!(worker.check().is_ok());
/// token.cancel();
/// assert!(worker.check().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}
