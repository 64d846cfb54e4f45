#![forbid(unsafe_code)]

//! Previous-value tracking: a cell of `(previous, current)` pairs.
//!
//! Every source notification, repeated nulls included, produces exactly one
//! pair. `previous` is `None` on the very first pair and after a null.

use std::cell::RefCell;

use tether_core::Observable;

/// `(previous, current)`; either side may be null.
pub type Change<T> = (Option<T>, Option<T>);

/// State owned by one previous-value cell.
struct PrevState<T> {
    past: Option<T>,
}

/// Pair each source value with the one before it.
pub fn with_prev_value<T>(source: &Observable<T>) -> Observable<Change<T>>
where
    T: Clone + 'static,
{
    let derived = Observable::new();
    let target = derived.downgrade();
    let state = RefCell::new(PrevState { past: None });

    let subscription = source.subscribe(move |value: Option<&T>| {
        let Some(target) = target.upgrade() else {
            return;
        };
        // Record before publishing so a re-entrant set downstream still
        // sees consecutive pairs.
        let past = std::mem::replace(&mut state.borrow_mut().past, value.cloned());
        target.set((past, value.cloned()));
    });
    derived.retain_subscription(subscription);
    tracing::debug!(
        message = "combinator.attach",
        kind = "with_prev_value",
        derived = derived.id()
    );
    derived
}
