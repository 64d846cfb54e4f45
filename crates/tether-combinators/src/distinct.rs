#![forbid(unsafe_code)]

//! Distinctness filter with a caller-defined predicate.
//!
//! The very first value observed from the source, including an explicit
//! null, is always republished. After that, an incoming value is
//! republished only when `is_distinct(incoming, previous)` returns true,
//! where `previous` is the last value that was republished. Rejected values
//! leave both the stored previous value and the derived cell untouched.
//!
//! The predicate runs with no borrow held. If it writes to the source, the
//! newer value is filtered and published first and the value that was being
//! tested is dropped.
//!
//! Republished values are clones of the source's value, so payloads with
//! shared identity (`Rc<_>`) stay pointer-equal to what the source holds.

use std::cell::RefCell;

use tether_core::{Observable, WeakObservable};

/// State owned by one distinct-filtered cell.
struct DistinctState<T> {
    initialized: bool,
    last: Option<T>,
}

/// Republish `source` values for which `is_distinct(incoming, previous)`
/// holds; the first value always passes.
pub fn distinct_by<T, P>(source: &Observable<T>, is_distinct: P) -> Observable<T>
where
    T: Clone + 'static,
    P: Fn(Option<&T>, Option<&T>) -> bool + 'static,
{
    let derived = Observable::new();
    let target = derived.downgrade();
    let origin = source.downgrade();
    let state = RefCell::new(DistinctState {
        initialized: false,
        last: None,
    });

    let subscription = source.subscribe(move |incoming: Option<&T>| {
        let Some(target) = target.upgrade() else {
            return;
        };
        let seen = source_version(&origin);
        let (initialized, last) = {
            let state = state.borrow();
            (state.initialized, state.last.clone())
        };
        // No borrow is held here: the predicate may write to the source.
        if initialized && !is_distinct(incoming, last.as_ref()) {
            return;
        }
        if source_version(&origin) != seen {
            tracing::trace!(message = "distinct.superseded", derived = target.id());
            return;
        }
        {
            let mut state = state.borrow_mut();
            state.initialized = true;
            state.last = incoming.cloned();
        }
        target.set(incoming.cloned());
    });
    derived.retain_subscription(subscription);
    tracing::debug!(
        message = "combinator.attach",
        kind = "distinct_by",
        derived = derived.id()
    );
    derived
}

fn source_version<T>(origin: &WeakObservable<T>) -> u64 {
    origin.upgrade().map_or(0, |source| source.version())
}

/// Republish only values that differ from the previously republished one.
pub fn distinct_until_changed<T>(source: &Observable<T>) -> Observable<T>
where
    T: Clone + PartialEq + 'static,
{
    distinct_by(source, |incoming, previous| incoming != previous)
}
