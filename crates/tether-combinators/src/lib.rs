#![forbid(unsafe_code)]

//! Derived-cell combinators over [`tether_core::Observable`].
//!
//! Every combinator returns a fresh derived cell that owns its upstream
//! subscriptions. Dropping the derived cell (and every clone of it) detaches
//! it from its sources.
//!
//! | combinator                 | publishes                                        |
//! |----------------------------|--------------------------------------------------|
//! | [`combine2`], [`combine3`] | tuple once every source is present               |
//! | [`distinct_by`]            | first value, then values passing the predicate   |
//! | [`map`]                    | every transform result, nulls included           |
//! | [`map_not_null`]           | present transform results only                   |
//! | [`switch_map`]             | values of the currently selected inner cell      |
//! | [`with_prev_value`]        | `(previous, current)` for every notification     |
//!
//! [`ObservableExt`] offers the same operations as methods.

pub mod combine;
pub mod distinct;
pub mod event;
pub mod ext;
pub mod map;
pub mod observe;
pub mod prev_value;

pub use combine::{combine2, combine3};
pub use distinct::{distinct_by, distinct_until_changed};
pub use event::SingleEvent;
pub use ext::ObservableExt;
pub use map::{map, map_not_null, switch_map};
pub use observe::{observe_non_null, observe_non_null_in};
pub use prev_value::{Change, with_prev_value};
