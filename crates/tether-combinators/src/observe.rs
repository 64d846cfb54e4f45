#![forbid(unsafe_code)]

//! Observation helpers that filter at subscription time.
//!
//! Unlike the other combinators these produce no derived cell, only a
//! [`Subscription`].

use tether_core::{Lifecycle, Observable, Result, Subscription};

/// Call `on_value` for present values only; null notifications are dropped.
pub fn observe_non_null<T>(source: &Observable<T>, on_value: impl Fn(&T) + 'static) -> Subscription
where
    T: Clone + 'static,
{
    source.subscribe(move |value: Option<&T>| {
        if let Some(value) = value {
            on_value(value);
        }
    })
}

/// [`observe_non_null`] gated by a lifecycle.
///
/// # Errors
///
/// Returns [`CellError::LifecycleDestroyed`](tether_core::CellError) if the
/// lifecycle is already destroyed.
pub fn observe_non_null_in<T>(
    source: &Observable<T>,
    lifecycle: &Lifecycle,
    on_value: impl Fn(&T) + 'static,
) -> Result<Subscription>
where
    T: Clone + 'static,
{
    source.observe(lifecycle, move |value: Option<&T>| {
        if let Some(value) = value {
            on_value(value);
        }
    })
}
