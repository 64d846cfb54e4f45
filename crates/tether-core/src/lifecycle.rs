#![forbid(unsafe_code)]

//! Lifecycle-gated observation.
//!
//! A [`Lifecycle`] is an explicit capability handed to
//! [`Observable::observe`]. Observers attached through it run only while the
//! lifecycle is [`Active`](LifecycleState::Active), catch up on the latest
//! unseen value when it becomes active, and are detached automatically when
//! it is destroyed.
//!
//! # Invariants
//!
//! 1. A gated observer receives each cell version at most once.
//! 2. No value is delivered while the lifecycle is inactive; on activation
//!    only the latest value is delivered, never the intermediate ones.
//! 3. `Destroyed` is terminal; later transitions are ignored.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{CellError, Result};
use crate::observable::{Callback, Observable, Subscription};

/// State of a [`Lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Created or paused; observers are held back.
    #[default]
    Inactive,
    /// Observers receive values.
    Active,
    /// Terminal; observers are detached.
    Destroyed,
}

/// Host-driven lifecycle that gates observers.
///
/// Cloning shares the lifecycle.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    state: Observable<LifecycleState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Create an inactive lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Observable::with_value(LifecycleState::Inactive),
        }
    }

    /// Create a lifecycle that is already active.
    #[must_use]
    pub fn active() -> Self {
        Self {
            state: Observable::with_value(LifecycleState::Active),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state.get().unwrap_or_default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }

    pub fn activate(&self) {
        self.transition(LifecycleState::Active);
    }

    pub fn deactivate(&self) {
        self.transition(LifecycleState::Inactive);
    }

    pub fn destroy(&self) {
        self.transition(LifecycleState::Destroyed);
    }

    fn transition(&self, next: LifecycleState) {
        let current = self.state();
        if current == next || current == LifecycleState::Destroyed {
            return;
        }
        tracing::debug!(message = "lifecycle.transition", from = ?current, to = ?next);
        self.state.set(next);
    }
}

/// Per-observer delivery bookkeeping.
struct Gate<T> {
    observer: Box<Callback<T>>,
    delivered: Cell<u64>,
}

impl<T> Gate<T> {
    fn offer(&self, version: u64, value: Option<&T>) {
        if version == 0 || version <= self.delivered.get() {
            return;
        }
        self.delivered.set(version);
        (self.observer)(value);
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Attach an observer gated by `lifecycle`.
    ///
    /// If the lifecycle is active and the cell is set, the observer runs
    /// immediately with the current value.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::LifecycleDestroyed`] if the lifecycle is already
    /// destroyed.
    pub fn observe(
        &self,
        lifecycle: &Lifecycle,
        observer: impl Fn(Option<&T>) + 'static,
    ) -> Result<Subscription> {
        if lifecycle.is_destroyed() {
            return Err(CellError::LifecycleDestroyed);
        }

        let gate = Rc::new(Gate {
            observer: Box::new(observer),
            delivered: Cell::new(0),
        });

        let cell_sub = {
            let gate = Rc::clone(&gate);
            let cell = self.clone();
            let lifecycle = lifecycle.clone();
            self.subscribe(move |value| {
                if lifecycle.is_active() {
                    gate.offer(cell.version(), value);
                }
            })
        };
        let upstream = Rc::new(RefCell::new(Some(cell_sub)));

        let state_sub = {
            let gate = Rc::clone(&gate);
            let cell = self.clone();
            let upstream = Rc::clone(&upstream);
            lifecycle.state.subscribe_changes(move |state| match state {
                Some(LifecycleState::Active) => {
                    let value = cell.get();
                    gate.offer(cell.version(), value.as_ref());
                }
                Some(LifecycleState::Destroyed) => {
                    tracing::debug!(message = "lifecycle.detach", cell = cell.id());
                    upstream.borrow_mut().take();
                }
                _ => {}
            })
        };

        Ok(Subscription::new((upstream, state_sub)))
    }
}
