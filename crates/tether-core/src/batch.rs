#![forbid(unsafe_code)]

//! Queued dispatch: defer notifications until a scope closes.
//!
//! While a [`BatchScope`] is open on the current thread, [`Observable::set`]
//! stores the new value immediately but queues the notification. When the
//! outermost scope is dropped, every touched cell is dispatched once, in the
//! order it was first touched, carrying its latest value. Repeated sets of
//! one cell inside a scope therefore coalesce into a single notification.
//!
//! Cells derived from a batched source are refreshed at flush time, not when
//! the source is written.
//!
//! # Failure Modes
//!
//! - **Observer panics during a flush**: the panic propagates out of the
//!   scope's drop. Cells not yet dispatched are re-armed without being
//!   notified; their next batched `set` queues normally.
//! - **Scope dropped while unwinding**: nothing is dispatched; every queued
//!   cell is re-armed.
//!
//! [`Observable::set`]: crate::Observable::set

use std::cell::RefCell;
use std::collections::VecDeque;
use std::marker::PhantomData;

/// A cell with a queued notification.
pub(crate) trait Deferred {
    /// Dispatch the cell's current value.
    fn flush(&self);
    /// Clear the queued mark without dispatching.
    fn abandon(&self);
}

#[derive(Default)]
struct BatchState {
    depth: u32,
    queue: VecDeque<Box<dyn Deferred>>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// Whether a [`BatchScope`] is open on the current thread.
#[must_use]
pub fn is_batching() -> bool {
    BATCH.with(|b| b.borrow().depth > 0)
}

pub(crate) fn defer(entry: Box<dyn Deferred>) {
    BATCH.with(|b| b.borrow_mut().queue.push_back(entry));
}

/// Entries taken off the thread-local queue at the outermost drop.
///
/// Whatever is still here when the guard drops (an observer panicked
/// mid-flush) is abandoned.
struct Flush {
    pending: VecDeque<Box<dyn Deferred>>,
}

impl Flush {
    fn run(&mut self) {
        while let Some(entry) = self.pending.pop_front() {
            entry.flush();
        }
    }
}

impl Drop for Flush {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::debug!(message = "batch.abandon", cells = self.pending.len());
        for entry in self.pending.drain(..) {
            entry.abandon();
        }
    }
}

/// RAII guard that defers notifications until the outermost scope exits.
///
/// Scopes nest; only the outermost drop flushes. The guard is tied to the
/// thread that created it.
#[must_use = "notifications flush when the BatchScope is dropped"]
pub struct BatchScope {
    _not_send: PhantomData<*const ()>,
}

impl BatchScope {
    /// Open a scope.
    pub fn new() -> Self {
        let depth = BATCH.with(|b| {
            let mut b = b.borrow_mut();
            b.depth += 1;
            b.depth
        });
        tracing::trace!(message = "batch.open", depth);
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope").finish()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let pending = BATCH.with(|b| {
            let mut b = b.borrow_mut();
            b.depth -= 1;
            if b.depth == 0 {
                std::mem::take(&mut b.queue)
            } else {
                VecDeque::new()
            }
        });
        if pending.is_empty() {
            return;
        }
        let mut flush = Flush { pending };
        if std::thread::panicking() {
            // Dropping `flush` re-arms every cell.
            return;
        }
        tracing::trace!(message = "batch.flush", cells = flush.pending.len());
        flush.run();
    }
}

/// Run `f` inside a [`BatchScope`] and flush afterwards.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}
