#![forbid(unsafe_code)]

//! Method-call surface for the combinators.
//!
//! ```
//! use tether_combinators::ObservableExt;
//! use tether_core::Observable;
//!
//! let width = Observable::with_value(3);
//! let height: Observable<i32> = Observable::new();
//! let size = width.combine_with(&height);
//! assert_eq!(size.get(), None);
//!
//! height.set(4);
//! assert_eq!(size.get(), Some((3, 4)));
//! ```

use tether_core::{Lifecycle, Observable, Result, Subscription};

use crate::combine::{combine2, combine3};
use crate::distinct::{distinct_by, distinct_until_changed};
use crate::map::{map, map_not_null, switch_map};
use crate::observe::{observe_non_null, observe_non_null_in};
use crate::prev_value::{Change, with_prev_value};

/// Combinators as methods on [`Observable`].
pub trait ObservableExt<T: Clone + 'static> {
    /// Same as [`combine2`]`(self, other)`.
    fn combine_with<B: Clone + 'static>(&self, other: &Observable<B>) -> Observable<(T, B)>;

    /// Same as [`combine3`]`(self, second, third)`.
    fn combine_with2<B, C>(
        &self,
        second: &Observable<B>,
        third: &Observable<C>,
    ) -> Observable<(T, B, C)>
    where
        B: Clone + 'static,
        C: Clone + 'static;

    /// Same as [`distinct_by`]`(self, is_distinct)`.
    fn distinct_by(
        &self,
        is_distinct: impl Fn(Option<&T>, Option<&T>) -> bool + 'static,
    ) -> Observable<T>;

    /// Same as [`distinct_until_changed`]`(self)`.
    fn distinct_until_changed(&self) -> Observable<T>
    where
        T: PartialEq;

    /// Same as [`map`]`(self, transform)`.
    fn map<K: Clone + 'static>(
        &self,
        transform: impl Fn(Option<&T>) -> Option<K> + 'static,
    ) -> Observable<K>;

    /// Same as [`map_not_null`]`(self, transform)`.
    fn map_not_null<K: Clone + 'static>(
        &self,
        transform: impl Fn(Option<&T>) -> Option<K> + 'static,
    ) -> Observable<K>;

    /// Same as [`switch_map`]`(self, select)`.
    fn switch_map<K: Clone + 'static>(
        &self,
        select: impl Fn(Option<&T>) -> Option<Observable<K>> + 'static,
    ) -> Observable<K>;

    /// Same as [`with_prev_value`]`(self)`.
    fn with_prev_value(&self) -> Observable<Change<T>>;

    /// Same as [`observe_non_null`]`(self, on_value)`.
    fn observe_non_null(&self, on_value: impl Fn(&T) + 'static) -> Subscription;

    /// Same as [`observe_non_null_in`]`(self, lifecycle, on_value)`.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::LifecycleDestroyed`](tether_core::CellError) if the
    /// lifecycle is already destroyed.
    fn observe_non_null_in(
        &self,
        lifecycle: &Lifecycle,
        on_value: impl Fn(&T) + 'static,
    ) -> Result<Subscription>;
}

impl<T: Clone + 'static> ObservableExt<T> for Observable<T> {
    fn combine_with<B: Clone + 'static>(&self, other: &Observable<B>) -> Observable<(T, B)> {
        combine2(self, other)
    }

    fn combine_with2<B, C>(
        &self,
        second: &Observable<B>,
        third: &Observable<C>,
    ) -> Observable<(T, B, C)>
    where
        B: Clone + 'static,
        C: Clone + 'static,
    {
        combine3(self, second, third)
    }

    fn distinct_by(
        &self,
        is_distinct: impl Fn(Option<&T>, Option<&T>) -> bool + 'static,
    ) -> Observable<T> {
        distinct_by(self, is_distinct)
    }

    fn distinct_until_changed(&self) -> Observable<T>
    where
        T: PartialEq,
    {
        distinct_until_changed(self)
    }

    fn map<K: Clone + 'static>(
        &self,
        transform: impl Fn(Option<&T>) -> Option<K> + 'static,
    ) -> Observable<K> {
        map(self, transform)
    }

    fn map_not_null<K: Clone + 'static>(
        &self,
        transform: impl Fn(Option<&T>) -> Option<K> + 'static,
    ) -> Observable<K> {
        map_not_null(self, transform)
    }

    fn switch_map<K: Clone + 'static>(
        &self,
        select: impl Fn(Option<&T>) -> Option<Observable<K>> + 'static,
    ) -> Observable<K> {
        switch_map(self, select)
    }

    fn with_prev_value(&self) -> Observable<Change<T>> {
        with_prev_value(self)
    }

    fn observe_non_null(&self, on_value: impl Fn(&T) + 'static) -> Subscription {
        observe_non_null(self, on_value)
    }

    fn observe_non_null_in(
        &self,
        lifecycle: &Lifecycle,
        on_value: impl Fn(&T) + 'static,
    ) -> Result<Subscription> {
        observe_non_null_in(self, lifecycle, on_value)
    }
}
