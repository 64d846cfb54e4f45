#![forbid(unsafe_code)]

//! Pairing combinators: tuples of the latest present values of 2 or 3 cells.
//!
//! # Invariants
//!
//! 1. The derived cell is recomputed once at construction (after every
//!    source is wired) and once per notification from any source.
//! 2. A tuple is published only when every source holds a present value.
//! 3. Partial presence publishes nothing: once a tuple has been published,
//!    a source going to null or being reset does **not** retract it. The
//!    derived cell keeps the last complete tuple.

use std::rc::Rc;

use tether_core::Observable;

/// Combine two cells into a cell of their value pairs.
pub fn combine2<A, B>(a: &Observable<A>, b: &Observable<B>) -> Observable<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let derived = Observable::new();

    let recompute: Rc<dyn Fn()> = {
        let a = a.clone();
        let b = b.clone();
        let target = derived.downgrade();
        Rc::new(move || {
            let Some(target) = target.upgrade() else {
                return;
            };
            if let (Some(x), Some(y)) = (a.get(), b.get()) {
                tracing::trace!(message = "combine.publish", derived = target.id(), arity = 2);
                target.set((x, y));
            }
        })
    };

    derived.retain_subscription(a.subscribe_changes(trigger(Rc::clone(&recompute))));
    derived.retain_subscription(b.subscribe_changes(trigger(Rc::clone(&recompute))));
    tracing::debug!(message = "combinator.attach", kind = "combine2", derived = derived.id());

    recompute();
    derived
}

/// Combine three cells into a cell of their value triples.
pub fn combine3<A, B, C>(
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
) -> Observable<(A, B, C)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    let derived = Observable::new();

    let recompute: Rc<dyn Fn()> = {
        let a = a.clone();
        let b = b.clone();
        let c = c.clone();
        let target = derived.downgrade();
        Rc::new(move || {
            let Some(target) = target.upgrade() else {
                return;
            };
            if let (Some(x), Some(y), Some(z)) = (a.get(), b.get(), c.get()) {
                tracing::trace!(message = "combine.publish", derived = target.id(), arity = 3);
                target.set((x, y, z));
            }
        })
    };

    derived.retain_subscription(a.subscribe_changes(trigger(Rc::clone(&recompute))));
    derived.retain_subscription(b.subscribe_changes(trigger(Rc::clone(&recompute))));
    derived.retain_subscription(c.subscribe_changes(trigger(Rc::clone(&recompute))));
    tracing::debug!(message = "combinator.attach", kind = "combine3", derived = derived.id());

    recompute();
    derived
}

/// Observer that ignores the notified value and reruns `recompute`.
fn trigger<T: 'static>(recompute: Rc<dyn Fn()>) -> impl Fn(Option<&T>) + 'static {
    move |_: Option<&T>| recompute()
}
