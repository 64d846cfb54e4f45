#![forbid(unsafe_code)]

//! Core: observable cells, subscriptions, batched dispatch, and lifecycles.
//!
//! - [`Observable`]: a shared, versioned, single-slot value with synchronous
//!   change notification. It tells "never set" apart from "set to null".
//! - [`Subscription`]: RAII guard that detaches its observer on drop.
//! - [`BatchScope`]: defers and coalesces notifications until the outermost
//!   scope exits.
//! - [`Lifecycle`]: explicit capability that gates observers on an
//!   active/inactive/destroyed host state.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). A cell holds its
//! observers weakly; subscriptions hold their cell strongly. Derived cells
//! own their upstream subscriptions via [`Observable::retain_subscription`],
//! so a chain of cells stays wired exactly as long as its tail is reachable.

pub mod batch;
pub mod error;
pub mod lifecycle;
pub mod observable;

pub use batch::{BatchScope, batch, is_batching};
pub use error::{CellError, Result};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use observable::{Callback, Observable, Subscription, WeakObservable};
