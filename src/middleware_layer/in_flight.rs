use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppError, Result};

/// Allows one submission at a time through a form.
#[derive(Clone, Debug, Default)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl InFlightGuard {
    /// Creates a new, idle `InFlightGuard`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the form.
    ///
    /// # Returns
    ///
    /// A permit that frees the form when dropped, or `AppError::Busy` if a
    /// submission is already running.
    pub fn acquire(&self) -> Result<InFlightPermit> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("⏳ Submission rejected, another one is in flight");
            return Err(AppError::Busy);
        }

        Ok(InFlightPermit {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Whether a submission is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one submission.
#[derive(Debug)]
pub struct InFlightPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_busy_until_release() {
        let guard = InFlightGuard::new();
        let permit = guard.acquire().unwrap();

        assert!(guard.is_busy());
        assert!(matches!(guard.acquire(), Err(AppError::Busy)));

        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.acquire().is_ok());
    }

    #[test]
    fn clones_share_the_flag() {
        let guard = InFlightGuard::new();
        let other = guard.clone();
        let _permit = guard.acquire().unwrap();
        assert!(matches!(other.acquire(), Err(AppError::Busy)));
    }
}
