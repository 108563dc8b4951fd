//! Re-entrancy flag for viewport sync and its drop guard.

use std::cell::Cell;
use std::rc::Rc;

/// Shared "sync in progress" flag.
///
/// Cloning shares the same flag. Single-threaded by construction.
#[derive(Debug, Clone, Default)]
pub struct SyncFlag(Rc<Cell<bool>>);

impl SyncFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sync is currently mutating the paired map.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.get()
    }

    /// Sets the flag until the returned guard drops.
    #[must_use]
    pub fn engage(&self) -> SyncGuard {
        self.0.set(true);
        SyncGuard(self.clone())
    }
}

/// Clears the flag on drop, including while unwinding from a panic.
#[derive(Debug)]
pub struct SyncGuard(SyncFlag);

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.0.0.set(false);
    }
}
