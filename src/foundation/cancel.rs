use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Cooperative cancellation flag shared between an export and whoever may abort it.
///
/// Clones observe the same flag. Cancellation is sticky: once set it cannot be cleared.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Return `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return [`SlidecastError::Cancelled`] if cancellation has been requested.
    pub fn check(&self) -> SlidecastResult<()> {
        if self.is_cancelled() {
            return Err(SlidecastError::Cancelled);
        }
        Ok(())
    }
}
