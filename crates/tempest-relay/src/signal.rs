//! Single-slot receive notification.
//!
//! The radio collaborator's receive-complete interrupt becomes a
//! one-deep atomic flag: notifications arriving while one is already
//! pending coalesce into a single wakeup rather than queueing. The
//! controller drains and clears the flag before starting a cycle, which
//! preserves exactly-once processing per signal.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cloneable handle to the one-deep receive-complete flag.
///
/// One clone lives with the radio's interrupt context, the other with the
/// relay runtime's poll loop.
#[derive(Debug, Clone, Default)]
pub struct ReceiveSignal {
    pending: Arc<AtomicBool>,
}

impl ReceiveSignal {
    /// Create an empty signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a reception as pending. Repeated calls coalesce.
    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Drain the flag, returning whether a reception was pending.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Peek without draining.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
