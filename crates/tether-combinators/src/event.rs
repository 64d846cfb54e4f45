#![forbid(unsafe_code)]

//! Single-consumer events layered on an observable cell.
//!
//! A [`SingleEvent`] delivers each `set` at most once, to at most one
//! observer. It suits one-shot signals (navigation requests, toasts) that
//! must not be replayed when an observer re-attaches.
//!
//! # Invariants
//!
//! 1. Every `set` marks the event pending; delivery clears the mark.
//! 2. An event set while no observer is attached stays pending and is
//!    delivered when an observer attaches (or, for a gated observer, when its
//!    lifecycle becomes active).
//! 3. At most one observer is attached at a time.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tether_core::{CellError, Lifecycle, Observable, Result, Subscription};

/// One-shot event cell with a single consumer.
pub struct SingleEvent<T> {
    cell: Observable<T>,
    pending: Rc<Cell<bool>>,
    /// Alive while an observer is attached.
    consumer: RefCell<Weak<()>>,
}

impl<T> Default for SingleEvent<T> {
    fn default() -> Self {
        Self {
            cell: Observable::new(),
            pending: Rc::new(Cell::new(false)),
            consumer: RefCell::new(Weak::new()),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SingleEvent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleEvent")
            .field("cell", &self.cell)
            .field("pending", &self.pending.get())
            .finish()
    }
}

impl<T: Clone + 'static> SingleEvent<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the event.
    pub fn set(&self, value: impl Into<Option<T>>) {
        self.pending.set(true);
        self.cell.set(value);
    }

    /// Last raised value, whether or not it was consumed.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.cell.get()
    }

    /// Whether a raised value is waiting for the observer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Attach the single observer.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::EventAlreadyObserved`] while another observer is
    /// attached.
    pub fn observe(&self, on_event: impl Fn(Option<&T>) + 'static) -> Result<Subscription> {
        let token = self.claim()?;
        let sub = self
            .cell
            .subscribe(consume_once(Rc::clone(&self.pending), on_event));
        Ok(Subscription::new((token, sub)))
    }

    /// Attach the single observer, gated by `lifecycle`.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::EventAlreadyObserved`] while another observer is
    /// attached, or [`CellError::LifecycleDestroyed`] if the lifecycle is
    /// destroyed.
    pub fn observe_in(
        &self,
        lifecycle: &Lifecycle,
        on_event: impl Fn(Option<&T>) + 'static,
    ) -> Result<Subscription> {
        let token = self.claim()?;
        let sub = self
            .cell
            .observe(lifecycle, consume_once(Rc::clone(&self.pending), on_event))?;
        Ok(Subscription::new((token, sub)))
    }

    fn claim(&self) -> Result<Rc<()>> {
        let mut consumer = self.consumer.borrow_mut();
        if consumer.strong_count() > 0 {
            tracing::debug!(message = "event.reject_observer", cell = self.cell.id());
            return Err(CellError::EventAlreadyObserved);
        }
        let token = Rc::new(());
        *consumer = Rc::downgrade(&token);
        Ok(token)
    }
}

/// Wrap `on_event` so it only runs when the event is pending, clearing it.
fn consume_once<T: 'static>(
    pending: Rc<Cell<bool>>,
    on_event: impl Fn(Option<&T>) + 'static,
) -> impl Fn(Option<&T>) + 'static {
    move |value: Option<&T>| {
        if pending.replace(false) {
            on_event(value);
        }
    }
}

impl SingleEvent<()> {
    /// Raise a payload-less event.
    pub fn call(&self) {
        self.set(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(Option<&()>) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move |_: Option<&()>| c.set(c.get() + 1))
    }

    #[test]
    fn each_set_is_delivered_once() {
        let event = SingleEvent::new();
        let (count, on_event) = counter();
        let _sub = event.observe(on_event).expect("first observer");

        event.call();
        event.call();
        assert_eq!(count.get(), 2);
        assert!(!event.is_pending());
    }

    #[test]
    fn consumed_event_is_not_replayed_on_reattach() {
        let event = SingleEvent::new();
        let (count, on_event) = counter();
        let sub = event.observe(on_event).expect("first observer");
        event.call();
        drop(sub);

        let (again, on_event) = counter();
        let _sub = event.observe(on_event).expect("slot released");
        assert_eq!(count.get(), 1);
        assert_eq!(again.get(), 0);
    }

    #[test]
    fn pending_event_is_delivered_on_attach() {
        let event: SingleEvent<String> = SingleEvent::new();
        event.set("navigate".to_string());
        assert!(event.is_pending());

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let _sub = event
            .observe(move |v: Option<&String>| *sink.borrow_mut() = v.cloned())
            .expect("first observer");
        assert_eq!(seen.borrow().as_deref(), Some("navigate"));
        assert!(!event.is_pending());
    }

    #[test]
    fn second_observer_is_rejected() {
        let event = SingleEvent::new();
        let (_c1, first) = counter();
        let (_c2, second) = counter();
        let _sub = event.observe(first).expect("first observer");
        let err = event.observe(second).unwrap_err();
        assert_eq!(err, CellError::EventAlreadyObserved);
    }

    #[test]
    fn gated_observer_waits_for_activation() {
        let event = SingleEvent::new();
        let lifecycle = Lifecycle::new();
        let (count, on_event) = counter();
        let _sub = event.observe_in(&lifecycle, on_event).expect("first observer");

        event.call();
        assert_eq!(count.get(), 0);
        assert!(event.is_pending());

        lifecycle.activate();
        assert_eq!(count.get(), 1);
        assert!(!event.is_pending());
    }

    #[test]
    fn destroyed_lifecycle_releases_claim() {
        let event = SingleEvent::<()>::new();
        let lifecycle = Lifecycle::new();
        lifecycle.destroy();
        let (_count, on_event) = counter();
        assert_eq!(
            event.observe_in(&lifecycle, on_event).unwrap_err(),
            CellError::LifecycleDestroyed
        );
        let (_count, on_event) = counter();
        assert!(event.observe(on_event).is_ok());
    }
}
