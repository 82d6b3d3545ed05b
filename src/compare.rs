//! The stable comparator and the projection seam it compares through.

use std::cmp::Ordering;

/// Maps an element to the key it is actually compared by.
///
/// The two calls of one comparison are projected together so that borrowed
/// keys (the [`Identity`] case) and owned keys (the closure case) share one
/// interface: the keys are handed to `with` by reference and die when it
/// returns.
///
/// This is the minimal local form of the comparator/projection abstraction;
/// user-facing entry points accept plain `FnMut(&T) -> K` key functions and
/// route them through the blanket impl below.
pub trait Projection<T> {
    /// The key type the comparator sees.
    type Key: ?Sized;

    /// Projects `a` and `b` and hands both keys to `with`.
    fn with_keys<R>(&mut self, a: &T, b: &T, with: impl FnOnce(&Self::Key, &Self::Key) -> R)
        -> R;
}

/// The default projection: elements are compared by their own value.
#[derive(Copy, Clone, Debug, Default)]
pub struct Identity;

impl<T> Projection<T> for Identity {
    type Key = T;

    fn with_keys<R>(&mut self, a: &T, b: &T, with: impl FnOnce(&T, &T) -> R) -> R {
        with(a, b)
    }
}

impl<T, K, F> Projection<T> for F
where
    F: FnMut(&T) -> K,
{
    type Key = K;

    fn with_keys<R>(&mut self, a: &T, b: &T, with: impl FnOnce(&K, &K) -> R) -> R {
        let ka = self(a);
        let kb = self(b);
        with(&ka, &kb)
    }
}

/// Wraps a user comparator and projection and breaks ties on the elements'
/// recorded original positions.
///
/// The position fallback only ever fires on a genuine tie, i.e. when the user
/// comparator reports less in neither direction. Positions are distinct, so
/// the result is a total order; a comparison sort driven by it has exactly
/// one valid output, which forces equal elements into increasing original
/// position order even if the wrapped routine would not preserve it on its
/// own.
///
/// A user comparator that is not a strict weak order yields an unspecified
/// relative order for the affected elements, same as for any comparison
/// sort; consistency is not validated here.
pub struct StableCompare<C, P> {
    compare: C,
    projection: P,
}

impl<C, P> StableCompare<C, P> {
    pub fn new(compare: C, projection: P) -> Self {
        Self {
            compare,
            projection,
        }
    }

    /// The user comparator, queryable by layers that special-case known
    /// comparator/projection pairs.
    pub fn comparator(&self) -> &C {
        &self.compare
    }

    /// The user projection, see [`comparator`](Self::comparator).
    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// Returns `true` iff decorated element `a` must sort strictly before
    /// `b`. Both are given as (element, original position).
    pub fn is_less<T>(&mut self, a: (&T, usize), b: (&T, usize)) -> bool
    where
        P: Projection<T>,
        C: FnMut(&P::Key, &P::Key) -> bool,
    {
        let (va, pos_a) = a;
        let (vb, pos_b) = b;

        let Self {
            compare,
            projection,
        } = self;
        let ord = projection.with_keys(va, vb, |ka, kb| {
            if compare(ka, kb) {
                Ordering::Less
            } else if compare(kb, ka) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });

        match ord {
            Ordering::Less => true,
            Ordering::Greater => false,
            // A tie in both directions: earlier original position wins.
            Ordering::Equal => pos_a < pos_b,
        }
    }
}
