//! Execution status flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    executing: AtomicBool,
    complete: AtomicBool,
}

/// Shared view of a chain's status.
///
/// Two independent flags rather than one state: callers poll "is it running"
/// and "has it finished" separately. Clones observe the same chain.
#[derive(Debug, Clone, Default)]
pub struct ChainStatus {
    flags: Arc<Flags>,
}

impl ChainStatus {
    /// `true` from the start of `run` until just before the completion handler fires.
    pub fn is_executing(&self) -> bool {
        self.flags.executing.load(Ordering::SeqCst)
    }

    /// `true` once the completion handler of the latest run has fired.
    pub fn is_complete(&self) -> bool {
        self.flags.complete.load(Ordering::SeqCst)
    }

    /// Marks the start of a run. Returns `None` if a run is already in flight.
    pub(crate) fn begin(&self) -> Option<RunGuard<'_>> {
        self.flags
            .executing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.flags.complete.store(false, Ordering::SeqCst);
        Some(RunGuard {
            status: self,
            finished: false,
        })
    }
}

/// Clears the executing flag even if the run future is dropped midway.
pub(crate) struct RunGuard<'a> {
    status: &'a ChainStatus,
    finished: bool,
}

impl RunGuard<'_> {
    /// Flips status to complete. Must happen before the completion handler runs.
    pub(crate) fn finish(mut self) {
        self.status.flags.complete.store(true, Ordering::SeqCst);
        self.status.flags.executing.store(false, Ordering::SeqCst);
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.status.flags.executing.store(false, Ordering::SeqCst);
        }
    }
}
