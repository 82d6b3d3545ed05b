//! The stable adapter: public calling surface and call dispatch.

use std::cmp::Ordering;

use crate::compare::{Identity, Projection, StableCompare};
use crate::decorate::{Association, DecoratedOps, DecorationBuf};
use crate::{SortOps, Sorter};

/// Adapter that makes any [`Sorter`] stable.
///
/// Entry points mirror the slice sorting conventions: plain, with a
/// comparator, with a key function, or with both. Whatever the wrapped
/// sorter returns is forwarded verbatim.
///
/// Wrapping a sorter that already reports [`Sorter::is_always_stable`] skips
/// decoration entirely; the final order is the same either way. `StableSort`
/// reports always-stable itself, so wrapping it again is idempotent.
pub struct StableSort<S> {
    sorter: S,
}

impl<S> StableSort<S> {
    pub const fn new(sorter: S) -> Self {
        Self { sorter }
    }

    pub fn get(&self) -> &S {
        &self.sorter
    }

    pub fn into_inner(self) -> S {
        self.sorter
    }
}

impl<S: Sorter> StableSort<S> {
    /// Sorts `v` stably by the `Ord` order of its elements.
    pub fn sort<T: Ord>(&self, v: &mut [T]) -> S::Output {
        self.sort_by(v, T::cmp)
    }

    /// Sorts `v` stably with a comparator.
    ///
    /// Elements that compare `Equal` keep their input order, regardless of
    /// what the wrapped sorter would do with them.
    pub fn sort_by<T, F>(&self, v: &mut [T], mut compare: F) -> S::Output
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        drive(
            &self.sorter,
            v,
            move |a: &T, b: &T| compare(a, b) == Ordering::Less,
            Identity,
        )
    }

    /// Sorts `v` stably by the keys produced by `key`.
    pub fn sort_by_key<T, K, F>(&self, v: &mut [T], key: F) -> S::Output
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        drive(&self.sorter, v, |a: &K, b: &K| a.lt(b), key)
    }

    /// Sorts `v` stably by projected keys compared with `compare`.
    pub fn sort_by_key_cmp<T, K, F, G>(&self, v: &mut [T], key: F, mut compare: G) -> S::Output
    where
        F: FnMut(&T) -> K,
        G: FnMut(&K, &K) -> Ordering,
    {
        drive(
            &self.sorter,
            v,
            move |a: &K, b: &K| compare(a, b) == Ordering::Less,
            key,
        )
    }
}

impl<S: Sorter> Sorter for StableSort<S> {
    type Output = S::Output;

    fn is_always_stable(&self) -> bool {
        true
    }

    fn sort_ops<O: SortOps>(&self, ops: &mut O) -> S::Output {
        if self.sorter.is_always_stable() {
            return self.sorter.sort_ops(ops);
        }

        // Element anchors are not reachable through an opaque ops view, so
        // the decoration degenerates to the traveling position tag; the view
        // itself moves the real elements.
        let len = ops.len();
        let mut tags = DecorationBuf::with_capacity(len);
        for pos in 0..len {
            tags.push_with(|| pos);
        }

        let mut tagged = TaggedOps {
            inner: ops,
            tags: tags.as_mut_slice(),
        };
        self.sorter.sort_ops(&mut tagged)
    }
}

/// Re-stabilization over an opaque ops view: ties break on position tags
/// that travel with the elements across swaps.
struct TaggedOps<'a, O> {
    inner: &'a mut O,
    tags: &'a mut [usize],
}

impl<O: SortOps> SortOps for TaggedOps<'_, O> {
    fn len(&self) -> usize {
        self.tags.len()
    }

    fn is_less(&mut self, a: usize, b: usize) -> bool {
        if self.inner.is_less(a, b) {
            true
        } else if self.inner.is_less(b, a) {
            false
        } else {
            self.tags[a] < self.tags[b]
        }
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.inner.swap_elements(a, b);
        self.tags.swap(a, b);
    }
}

/// Plain, undecorated view of the input slice: used when the wrapped sorter
/// guarantees stability on its own.
struct DirectOps<'a, T, C, P> {
    v: &'a mut [T],
    compare: C,
    projection: P,
}

impl<T, C, P> SortOps for DirectOps<'_, T, C, P>
where
    P: Projection<T>,
    C: FnMut(&P::Key, &P::Key) -> bool,
{
    fn len(&self) -> usize {
        self.v.len()
    }

    fn is_less(&mut self, a: usize, b: usize) -> bool {
        let Self {
            v,
            compare,
            projection,
        } = self;
        projection.with_keys(&v[a], &v[b], |ka, kb| compare(ka, kb))
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.v.swap(a, b);
    }
}

/// Call dispatch: decorate unless the sorter is already stable, run the
/// sorter, and forward its output once the buffer is torn down.
fn drive<S, T, C, P>(sorter: &S, v: &mut [T], compare: C, projection: P) -> S::Output
where
    S: Sorter,
    P: Projection<T>,
    C: FnMut(&P::Key, &P::Key) -> bool,
{
    if sorter.is_always_stable() {
        return sorter.sort_ops(&mut DirectOps {
            v,
            compare,
            projection,
        });
    }

    let len = v.len();
    let base = v.as_mut_ptr();

    // One forward pass over the input: tag every element with its position.
    // A panic anywhere past this point, whether from an initializer, the
    // user comparator or projection, or the wrapped sorter, unwinds through
    // the buffer's teardown before it reaches the caller.
    let mut assocs = DecorationBuf::with_capacity(len);
    for pos in 0..len {
        // SAFETY: `pos` is in bounds of `v`, and every association dies with
        // the buffer before `v` is reachable again.
        assocs.push_with(|| unsafe { Association::new(base.add(pos), pos) });
    }
    debug_assert_eq!(assocs.len(), len);

    let mut decorated = DecoratedOps::new(
        assocs.as_mut_slice(),
        StableCompare::new(compare, projection),
    );
    sorter.sort_ops(&mut decorated)
}
