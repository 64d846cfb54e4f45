#![forbid(unsafe_code)]

//! Tether public facade crate.
//!
//! Observable cells with explicit null-versus-unset semantics, plus the
//! combinators that derive cells from other cells.
//!
//! ```
//! use tether::prelude::*;
//!
//! let a: Observable<i32> = Observable::new();
//! let changes = a.with_prev_value();
//! a.set(42);
//! a.set(666);
//! assert_eq!(changes.get(), Some((Some(42), Some(666))));
//! ```

pub use tether_combinators as combinators;
pub use tether_core as core;
#[cfg(feature = "test-helpers")]
pub use tether_harness as harness;

pub mod prelude {
    pub use tether_combinators::{
        Change, ObservableExt, SingleEvent, combine2, combine3, distinct_by,
        distinct_until_changed, map, map_not_null, observe_non_null, observe_non_null_in,
        switch_map, with_prev_value,
    };
    pub use tether_core::{
        BatchScope, CellError, Lifecycle, LifecycleState, Observable, Subscription, batch,
    };

    #[cfg(feature = "test-helpers")]
    pub use tether_harness::{Recorder, observe_for_testing};
}
