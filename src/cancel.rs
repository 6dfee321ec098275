//! Cooperative cancellation shared by all writers of a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag checked by writers at every chunk boundary.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every writer holding this token to stop at its next chunk.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
