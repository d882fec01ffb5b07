//! Run-wide cancellation flag.
//!
//! Set once (e.g. on Ctrl-C). Workers stop taking new tasks, the built-in
//! transport aborts its transfer from the progress callback, and external
//! downloaders are killed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
