//! Duplicate-submission guard

use std::sync::atomic::{AtomicBool, Ordering};

use biocloud_common::{Error, Result};

/// Marks an operation as in flight; a second start fails until the first
/// guard is dropped
pub struct InFlight {
    busy: AtomicBool,
    operation: &'static str,
}

impl InFlight {
    pub const fn new(operation: &'static str) -> Self {
        Self {
            busy: AtomicBool::new(false),
            operation,
        }
    }

    pub fn begin(&self) -> Result<InFlightGuard<'_>> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyPending(self.operation));
        }
        Ok(InFlightGuard { flag: &self.busy })
    }

    pub fn is_pending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears the in-flight flag on drop, including when the owning future is
/// cancelled
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
