#![forbid(unsafe_code)]

//! Mapping combinators.
//!
//! | combinator      | null result of transform | transform sees            |
//! |-----------------|--------------------------|---------------------------|
//! | [`map`]         | published as null        | every notification        |
//! | [`map_not_null`]| dropped                  | every notification        |
//! | [`switch_map`]  | detaches, publishes none | every notification        |
//!
//! A source that has never been set never invokes the transform. A source
//! set to an explicit null does invoke it with `None`; a transform that
//! unwraps without guarding panics, and the panic propagates to the caller
//! of `set`.

use std::cell::RefCell;

use tether_core::{Observable, Subscription};

/// Publish `transform(value)` for every source notification, nulls included.
pub fn map<T, K, F>(source: &Observable<T>, transform: F) -> Observable<K>
where
    T: Clone + 'static,
    K: Clone + 'static,
    F: Fn(Option<&T>) -> Option<K> + 'static,
{
    let derived = Observable::new();
    let target = derived.downgrade();
    let subscription = source.subscribe(move |value: Option<&T>| {
        if let Some(target) = target.upgrade() {
            target.set(transform(value));
        }
    });
    derived.retain_subscription(subscription);
    tracing::debug!(message = "combinator.attach", kind = "map", derived = derived.id());
    derived
}

/// Publish `transform(value)` only when it is present.
///
/// A null result leaves the derived cell as it was: unset if nothing has
/// been published yet, otherwise holding the last present result.
pub fn map_not_null<T, K, F>(source: &Observable<T>, transform: F) -> Observable<K>
where
    T: Clone + 'static,
    K: Clone + 'static,
    F: Fn(Option<&T>) -> Option<K> + 'static,
{
    let derived = Observable::new();
    let target = derived.downgrade();
    let subscription = source.subscribe(move |value: Option<&T>| {
        let Some(target) = target.upgrade() else {
            return;
        };
        match transform(value) {
            Some(mapped) => target.set(mapped),
            None => tracing::trace!(message = "map_not_null.skip", derived = target.id()),
        }
    });
    derived.retain_subscription(subscription);
    tracing::debug!(
        message = "combinator.attach",
        kind = "map_not_null",
        derived = derived.id()
    );
    derived
}

/// Inner cell currently forwarded by a `switch_map`.
struct SwitchState<K> {
    current: Option<Observable<K>>,
    forwarding: Option<Subscription>,
}

/// Forward the values of whichever cell `select` picks for the latest
/// source value.
///
/// Re-selecting the cell already being forwarded is a no-op. Picking a
/// different cell detaches the previous one and forwards the new one,
/// starting with its current value. Picking `None` detaches and publishes
/// nothing.
pub fn switch_map<T, K, F>(source: &Observable<T>, select: F) -> Observable<K>
where
    T: Clone + 'static,
    K: Clone + 'static,
    F: Fn(Option<&T>) -> Option<Observable<K>> + 'static,
{
    let derived = Observable::new();
    let target = derived.downgrade();
    let state = RefCell::new(SwitchState {
        current: None,
        forwarding: None,
    });

    let subscription = source.subscribe(move |value: Option<&T>| {
        if target.upgrade().is_none() {
            return;
        }
        let next = select(value);
        let previous = {
            let mut state = state.borrow_mut();
            let unchanged = match (&state.current, &next) {
                (Some(current), Some(next)) => current.ptr_eq(next),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                return;
            }
            state.current = None;
            state.forwarding.take()
        };
        drop(previous);

        let Some(inner) = next else {
            tracing::debug!(message = "switch_map.detach");
            return;
        };
        tracing::debug!(message = "switch_map.retarget", inner = inner.id());
        let forward_to = target.clone();
        let forwarding = inner.subscribe(move |v: Option<&K>| {
            if let Some(target) = forward_to.upgrade() {
                target.set(v.cloned());
            }
        });
        let mut state = state.borrow_mut();
        state.current = Some(inner);
        state.forwarding = Some(forwarding);
    });
    derived.retain_subscription(subscription);
    tracing::debug!(message = "combinator.attach", kind = "switch_map", derived = derived.id());
    derived
}
