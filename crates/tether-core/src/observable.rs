#![forbid(unsafe_code)]

//! Single-slot observable cells with synchronous change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps its state in `Rc<RefCell<..>>`; cloning a handle
//! shares the cell. Subscribers are stored as `Weak` callbacks. The strong
//! side lives inside the [`Subscription`] returned to the caller, so dropping
//! the guard is all it takes to detach. Dead entries are pruned lazily on the
//! next dispatch.
//!
//! A cell distinguishes three states:
//!
//! | `version()` | `get()`   | meaning                      |
//! |-------------|-----------|------------------------------|
//! | `0`         | `None`    | never set (absent)           |
//! | `> 0`       | `None`    | set to an explicit null      |
//! | `> 0`       | `Some(v)` | holds a present value        |
//!
//! # Invariants
//!
//! 1. Version increments by exactly 1 per `set`, whether or not the value
//!    compares equal to the previous one.
//! 2. Subscribers are notified in registration order.
//! 3. No `RefCell` borrow is held while an observer runs, so observers may
//!    read or write any cell, including the one notifying them.
//! 4. A nested `set` issued from inside an observer supersedes the outer
//!    dispatch: every subscriber sees the newer value and the outer loop
//!    stops, so no subscriber receives an older value after a newer one.
//! 5. Detaching a [`Subscription`] takes effect immediately, even in the
//!    middle of a dispatch.
//!
//! # Failure Modes
//!
//! - **Observer panics**: the panic propagates out of `set`. The value and
//!   version are already updated; later subscribers in that dispatch are
//!   skipped.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::batch;

static NEXT_OBSERVABLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_observable_id() -> u64 {
    NEXT_OBSERVABLE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Observer callback. `None` is an explicit null payload.
pub type Callback<T> = dyn Fn(Option<&T>);

struct ObservableInner<T> {
    id: u64,
    value: Option<T>,
    /// 0 until the first `set`.
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
    /// Upstream subscriptions owned by a derived cell.
    upstream: Vec<Subscription>,
    /// A dispatch is queued on the current `BatchScope`.
    dispatch_pending: bool,
}

/// A shared, versioned, single-slot value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** cell.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("id", &inner.id)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::from_state(None, 0)
    }
}

impl<T> Observable<T> {
    fn from_state(value: Option<T>, version: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                id: next_observable_id(),
                value,
                version,
                subscribers: Vec::new(),
                upstream: Vec::new(),
                dispatch_pending: false,
            })),
        }
    }

    /// Create a cell that has never been set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cell initialized with a present value.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self::from_state(Some(value), 1)
    }

    /// Create an initialized cell. `None` is an explicit null payload, which
    /// new subscribers will receive.
    #[must_use]
    pub fn with_initial(value: Option<T>) -> Self {
        Self::from_state(value, 1)
    }

    /// Process-unique identifier, used in log events.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Number of `set` calls so far (plus one for an initialized constructor).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Whether the cell has ever held a value, including a null payload.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.borrow().version > 0
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls `set` on the same cell.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let inner = self.inner.borrow();
        f(inner.value.as_ref())
    }

    /// Number of attached, still-live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle to this cell.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Tie an upstream subscription to the lifetime of this cell.
    ///
    /// Derived cells use this to own their subscriptions to the cells they
    /// read from; the subscriptions are released when the last handle to
    /// this cell is dropped.
    pub fn retain_subscription(&self, subscription: Subscription) {
        self.inner.borrow_mut().upstream.push(subscription);
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Current value (cloned). `None` when unset or holding a null payload.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.inner.borrow().value.clone()
    }

    /// Replace the value and notify subscribers.
    ///
    /// Accepts either `T` or `Option<T>`; `None` stores an explicit null.
    /// Inside a [`BatchScope`](crate::BatchScope) notification is deferred
    /// until the outermost scope closes.
    pub fn set(&self, value: impl Into<Option<T>>) {
        let (id, version) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value.into();
            inner.version += 1;
            (inner.id, inner.version)
        };
        tracing::trace!(message = "observable.set", id, version);

        if batch::is_batching() {
            self.defer_dispatch();
        } else {
            self.dispatch();
        }
    }

    /// Attach an observer.
    ///
    /// If the cell is set, the observer is called once immediately with the
    /// current value (a null payload included), then once per later `set`.
    pub fn subscribe(&self, observer: impl Fn(Option<&T>) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(observer);
        let subscription = self.attach(&callback);

        let current = {
            let inner = self.inner.borrow();
            (inner.version > 0).then(|| inner.value.clone())
        };
        if let Some(value) = current {
            callback(value.as_ref());
        }
        subscription
    }

    /// Attach an observer that only sees values set after this call.
    pub fn subscribe_changes(&self, observer: impl Fn(Option<&T>) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(observer);
        self.attach(&callback)
    }

    fn attach(&self, callback: &Rc<Callback<T>>) -> Subscription {
        let (id, count) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.push(Rc::downgrade(callback));
            (inner.id, inner.subscribers.len())
        };
        tracing::trace!(message = "observable.subscribe", id, subscribers = count);

        // The guard keeps the source alive; the source only holds a weak
        // reference back to the callback.
        Subscription::new((Rc::clone(callback), self.clone()))
    }

    fn dispatch(&self) {
        let (version, snapshot, subscribers) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            (
                inner.version,
                inner.value.clone(),
                inner.subscribers.clone(),
            )
        };

        for weak in subscribers {
            if self.inner.borrow().version != version {
                // A nested set already delivered a newer value to everyone.
                break;
            }
            if let Some(callback) = weak.upgrade() {
                callback(snapshot.as_ref());
            }
        }
    }

    fn defer_dispatch(&self) {
        let first = {
            let mut inner = self.inner.borrow_mut();
            !std::mem::replace(&mut inner.dispatch_pending, true)
        };
        if first {
            batch::defer(Box::new(self.clone()));
        }
    }
}

impl<T: Clone + 'static> batch::Deferred for Observable<T> {
    fn flush(&self) {
        self.inner.borrow_mut().dispatch_pending = false;
        self.dispatch();
    }

    fn abandon(&self) {
        self.inner.borrow_mut().dispatch_pending = false;
    }
}

/// Non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakObservable<T> {
    /// Recover a strong handle if the cell is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

/// RAII guard for an attached observer.
///
/// Dropping the guard, or calling [`unsubscribe`](Self::unsubscribe),
/// detaches the observer. A subscription keeps its source cell alive.
#[must_use = "dropping a Subscription detaches its observer"]
pub struct Subscription {
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    /// Wrap anything whose drop should end the subscription.
    pub fn new(guard: impl Any) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }

    /// Detach now. Idempotent.
    pub fn unsubscribe(&mut self) {
        if self.guard.take().is_some() {
            tracing::trace!(message = "subscription.detach");
        }
    }

    /// Whether the observer is still attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<Option<T>>>>, impl Fn(Option<&T>)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |v: Option<&T>| sink.borrow_mut().push(v.cloned()))
    }

    #[test]
    fn new_is_unset() {
        let cell: Observable<i32> = Observable::new();
        assert!(!cell.is_set());
        assert_eq!(cell.get(), None);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn with_value_is_set() {
        let cell = Observable::with_value(7);
        assert!(cell.is_set());
        assert_eq!(cell.get(), Some(7));
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn null_payload_is_distinct_from_unset() {
        let null: Observable<i32> = Observable::with_initial(None);
        let unset: Observable<i32> = Observable::new();
        assert_eq!(null.get(), unset.get());
        assert!(null.is_set());
        assert!(!unset.is_set());
    }

    #[test]
    fn set_bumps_version_even_for_equal_values() {
        let cell = Observable::with_value(1);
        cell.set(1);
        cell.set(1);
        assert_eq!(cell.version(), 3);
    }

    #[test]
    fn subscribe_replays_current_value() {
        let cell = Observable::with_value(5);
        let (log, observer) = recorder();
        let _sub = cell.subscribe(observer);
        assert_eq!(*log.borrow(), vec![Some(5)]);
    }

    #[test]
    fn subscribe_replays_null_payload() {
        let cell: Observable<i32> = Observable::with_initial(None);
        let (log, observer) = recorder();
        let _sub = cell.subscribe(observer);
        assert_eq!(*log.borrow(), vec![None]);
    }

    #[test]
    fn subscribe_on_unset_does_not_replay() {
        let cell: Observable<i32> = Observable::new();
        let (log, observer) = recorder();
        let _sub = cell.subscribe(observer);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn subscribe_changes_skips_current_value() {
        let cell = Observable::with_value(5);
        let (log, observer) = recorder();
        let _sub = cell.subscribe_changes(observer);
        assert!(log.borrow().is_empty());
        cell.set(6);
        assert_eq!(*log.borrow(), vec![Some(6)]);
    }

    #[test]
    fn every_set_notifies() {
        let cell: Observable<i32> = Observable::new();
        let (log, observer) = recorder();
        let _sub = cell.subscribe(observer);
        cell.set(1);
        cell.set(None);
        cell.set(None);
        cell.set(1);
        assert_eq!(*log.borrow(), vec![Some(1), None, None, Some(1)]);
    }

    #[test]
    fn notification_order_matches_registration() {
        let cell: Observable<i32> = Observable::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = Rc::clone(&order);
        let _s1 = cell.subscribe(move |_: Option<&i32>| o1.borrow_mut().push(1));
        let o2 = Rc::clone(&order);
        let _s2 = cell.subscribe(move |_: Option<&i32>| o2.borrow_mut().push(2));
        let o3 = Rc::clone(&order);
        let _s3 = cell.subscribe(move |_: Option<&i32>| o3.borrow_mut().push(3));

        cell.set(0);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn drop_subscription_detaches() {
        let cell: Observable<i32> = Observable::new();
        let (log, observer) = recorder();
        let sub = cell.subscribe(observer);
        cell.set(1);
        drop(sub);
        cell.set(2);
        assert_eq!(*log.borrow(), vec![Some(1)]);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let cell: Observable<i32> = Observable::new();
        let (log, observer) = recorder();
        let mut sub = cell.subscribe(observer);
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        cell.set(1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn detach_mid_dispatch_takes_effect_immediately() {
        let cell: Observable<i32> = Observable::new();
        let second_calls = Rc::new(Cell::new(0u32));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot_for_first = Rc::clone(&slot);
        let _first = cell.subscribe_changes(move |_: Option<&i32>| {
            slot_for_first.borrow_mut().take();
        });
        let calls = Rc::clone(&second_calls);
        *slot.borrow_mut() = Some(cell.subscribe_changes(move |_| {
            calls.set(calls.get() + 1);
        }));

        cell.set(1);
        assert_eq!(second_calls.get(), 0);
    }

    #[test]
    fn observer_may_read_notifying_cell() {
        let cell: Observable<i32> = Observable::new();
        let seen = Rc::new(Cell::new(0));
        let reader = cell.clone();
        let seen_clone = Rc::clone(&seen);
        let _sub = cell.subscribe_changes(move |_| {
            seen_clone.set(reader.get().unwrap_or_default());
        });
        cell.set(9);
        assert_eq!(seen.get(), 9);
    }

    #[test]
    fn nested_set_supersedes_outer_dispatch() {
        let cell: Observable<i32> = Observable::new();
        let writer = cell.clone();
        let _bump = cell.subscribe_changes(move |v: Option<&i32>| {
            if v == Some(&1) {
                writer.set(2);
            }
        });
        let (log, observer) = recorder();
        let _late = cell.subscribe_changes(observer);

        cell.set(1);
        // The late subscriber never sees the superseded value.
        assert_eq!(*log.borrow(), vec![Some(2)]);
        assert_eq!(cell.get(), Some(2));
    }

    #[test]
    fn subscription_keeps_source_alive() {
        let weak;
        let sub;
        {
            let cell = Observable::with_value(3);
            weak = cell.downgrade();
            sub = cell.subscribe(|_: Option<&i32>| {});
        }
        assert!(weak.upgrade().is_some());
        drop(sub);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn retained_subscription_released_with_cell() {
        let source = Observable::with_value(1);
        let derived: Observable<i32> = Observable::new();
        derived.retain_subscription(source.subscribe(|_| {}));
        assert_eq!(source.subscriber_count(), 1);
        drop(derived);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn clone_shares_state() {
        let a: Observable<String> = Observable::new();
        let b = a.clone();
        a.set("x".to_string());
        assert_eq!(b.get().as_deref(), Some("x"));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Observable::new()));
    }

    #[test]
    fn with_access_by_reference() {
        let cell = Observable::with_value(vec![1, 2, 3]);
        let sum = cell.with(|v| v.map_or(0, |v| v.iter().sum::<i32>()));
        assert_eq!(sum, 6);
    }

    #[test]
    fn ids_are_unique() {
        let a: Observable<u8> = Observable::new();
        let b: Observable<u8> = Observable::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn debug_format() {
        let cell = Observable::with_value(42);
        let dbg = format!("{cell:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        let sub = cell.subscribe(|_| {});
        assert!(format!("{sub:?}").contains("active: true"));
    }

    #[test]
    #[traced_test]
    fn set_emits_trace_event() {
        let cell: Observable<u8> = Observable::new();
        cell.set(1);
        assert!(logs_contain("observable.set"));
    }

    proptest::proptest! {
        #[test]
        fn version_counts_sets_and_every_subscriber_sees_every_set(
            sets in proptest::collection::vec(proptest::option::of(0u8..8), 0..32),
        ) {
            let cell: Observable<u8> = Observable::new();
            let (first, on_first) = recorder();
            let (second, on_second) = recorder();
            let _a = cell.subscribe(on_first);
            let _b = cell.subscribe(on_second);

            for value in &sets {
                cell.set(*value);
            }
            proptest::prop_assert_eq!(cell.version(), sets.len() as u64);
            proptest::prop_assert_eq!(cell.is_set(), !sets.is_empty());
            proptest::prop_assert_eq!(cell.get(), sets.last().copied().flatten());
            proptest::prop_assert_eq!(&*first.borrow(), &sets);
            proptest::prop_assert_eq!(&*second.borrow(), &sets);
        }
    }
}
