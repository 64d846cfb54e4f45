#![forbid(unsafe_code)]

//! Notification recorder.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tether_core::{Observable, Subscription};

/// Records every notification a cell delivers.
///
/// Each entry is one observer call: `None` is a null notification. The
/// recorder stays attached until it is dropped or [`detach`](Self::detach)
/// is called.
pub struct Recorder<T> {
    events: Rc<RefCell<Vec<Option<T>>>>,
    subscription: Subscription,
}

impl<T: fmt::Debug> fmt::Debug for Recorder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("events", &self.events.borrow())
            .field("attached", &self.subscription.is_active())
            .finish()
    }
}

impl<T: Clone + 'static> Recorder<T> {
    /// Attach to `cell`, recording its current value first if it is set.
    #[must_use]
    pub fn attach(cell: &Observable<T>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription =
            cell.subscribe(move |value: Option<&T>| sink.borrow_mut().push(value.cloned()));
        Self {
            events,
            subscription,
        }
    }

    /// Attach to `cell`, recording only notifications after this call.
    #[must_use]
    pub fn attach_changes(cell: &Observable<T>) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = cell
            .subscribe_changes(move |value: Option<&T>| sink.borrow_mut().push(value.cloned()));
        Self {
            events,
            subscription,
        }
    }

    /// Every recorded notification, nulls included.
    #[must_use]
    pub fn events(&self) -> Vec<Option<T>> {
        self.events.borrow().clone()
    }

    /// Recorded present values, nulls skipped.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.events.borrow().iter().flatten().cloned().collect()
    }

    /// The most recent notification, or `None` if nothing was recorded.
    #[must_use]
    pub fn last(&self) -> Option<Option<T>> {
        self.events.borrow().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget what has been recorded so far; stays attached.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Stop recording. Already recorded events are kept.
    pub fn detach(&mut self) {
        self.subscription.unsubscribe();
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }
}
