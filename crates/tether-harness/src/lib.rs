#![forbid(unsafe_code)]

//! Test helpers for tether cells.
//!
//! - [`observe_for_testing`]: read a cell while an observer is attached, the
//!   way a host would see it.
//! - [`Recorder`]: capture every notification a cell delivers, in order.

pub mod recorder;

pub use recorder::Recorder;

use tether_core::Observable;

/// Attach a no-op observer, run `block` with the cell's current value, then
/// detach.
///
/// Returns whatever `block` returns. The observer is detached even if
/// `block` panics.
///
/// ```
/// use tether_core::Observable;
/// use tether_harness::observe_for_testing;
///
/// let cell = Observable::with_value(3);
/// observe_for_testing(&cell, |value| assert_eq!(value, Some(3)));
/// assert_eq!(cell.subscriber_count(), 0);
/// ```
pub fn observe_for_testing<T, R>(cell: &Observable<T>, block: impl FnOnce(Option<T>) -> R) -> R
where
    T: Clone + 'static,
{
    let _observer = cell.subscribe(|_: Option<&T>| {});
    tracing::trace!(message = "harness.observe", cell = cell.id());
    block(cell.get())
}
