//! Make any comparison sort stable.
//!
//! [`StableSort`] wraps an arbitrary [`Sorter`] and guarantees that elements
//! comparing equal keep their input order, without knowing anything about the
//! wrapped routine. The mechanism is decorate-sort-undecorate: each element
//! is tagged with its original position, the wrapped sorter runs over the
//! tagged view with a comparator that breaks ties on the tags, and the tags
//! disappear when the call returns.
//!
//! Sorters that are stable by construction can say so via
//! [`Sorter::is_always_stable`] and skip the decoration.
//!
//! ```
//! use sort_stabilizer::{FnSorter, SortOps, StableSort};
//!
//! // Gnome sort happens to be stable, but the adapter does not need to
//! // know that; any swap-based routine will do.
//! let gnome = FnSorter(|ops: &mut dyn SortOps| {
//!     let mut i = 0;
//!     while i < ops.len() {
//!         if i == 0 || !ops.is_less(i, i - 1) {
//!             i += 1;
//!         } else {
//!             ops.swap_elements(i, i - 1);
//!             i -= 1;
//!         }
//!     }
//! });
//!
//! let mut v = [(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
//! StableSort::new(gnome).sort_by_key(&mut v, |t| t.0);
//! assert_eq!(v, [(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
//! ```

mod adapter;
mod compare;
mod decorate;

pub use adapter::StableSort;
pub use compare::{Identity, Projection, StableCompare};

/// Indexed view of a sequence handed to a [`Sorter`].
///
/// Indices run from `0` to `len()`. Ordering decisions go through
/// [`is_less`](Self::is_less); [`swap_elements`](Self::swap_elements) is the
/// only reordering primitive. The trait is object safe, so a sorter can also
/// be written as a plain closure over `&mut dyn SortOps`, see [`FnSorter`].
pub trait SortOps {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the element at `a` sorts strictly before the element at `b`.
    fn is_less(&mut self, a: usize, b: usize) -> bool;

    /// Exchanges the elements at `a` and `b`. A no-op when `a == b`.
    fn swap_elements(&mut self, a: usize, b: usize);
}

/// A comparison sorting routine, stable or not.
///
/// The contract a sorter must uphold: it observes elements only through
/// [`SortOps::is_less`] and reorders them only through
/// [`SortOps::swap_elements`]. It must not cache comparison outcomes across
/// swaps and must not reorder by any other means; the view's comparison
/// results for a pair of slots change when their contents are swapped.
///
/// On return from [`sort_ops`](Self::sort_ops) the view must be sorted with
/// respect to `is_less`. What else the call produces is up to the sorter via
/// [`Output`](Self::Output); [`StableSort`] forwards it verbatim.
pub trait Sorter {
    type Output;

    /// `true` if this sorter preserves the relative order of equal elements
    /// for every input and comparator. [`StableSort`] skips decoration for
    /// such sorters; the resulting order is the same either way.
    fn is_always_stable(&self) -> bool {
        false
    }

    fn sort_ops<O: SortOps>(&self, ops: &mut O) -> Self::Output;
}

/// Adapts a closure over `&mut dyn SortOps` into a [`Sorter`].
///
/// The closure form of the sorter contract, for routines that do not need a
/// carrier type of their own. See the crate example.
pub struct FnSorter<F>(pub F);

impl<F> Sorter for FnSorter<F>
where
    F: Fn(&mut dyn SortOps),
{
    type Output = ();

    fn sort_ops<O: SortOps>(&self, ops: &mut O) {
        let ops: &mut dyn SortOps = ops;
        (self.0)(ops)
    }
}
