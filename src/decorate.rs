//! Decoration machinery: the association buffer built before an unstable
//! sorter runs, and the decorated sequence view handed to it.

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::compare::{Projection, StableCompare};
use crate::SortOps;

/// One decorated element: the position an element had at decoration time,
/// plus an anchor to the slice slot the association watches.
///
/// The anchor is assigned once and never reassigned. When the wrapped sorter
/// swaps two decorated slots, the underlying elements are exchanged through
/// the anchors and the position tags travel with them, so a tag always rides
/// with the value it was attached to during decoration.
pub(crate) struct Association<T> {
    elem: NonNull<T>,
    pos: usize,
}

impl<T> Association<T> {
    /// # Safety
    ///
    /// `elem` must be non-null and point at an element that stays live for
    /// as long as the association is used.
    pub(crate) unsafe fn new(elem: *mut T, pos: usize) -> Self {
        Self {
            // SAFETY: non-null per the contract above.
            elem: unsafe { NonNull::new_unchecked(elem) },
            pos,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// # Safety
    ///
    /// The anchored element must be live and not mutably aliased for the
    /// duration of the borrow.
    pub(crate) unsafe fn value(&self) -> &T {
        // SAFETY: per the contract above.
        unsafe { self.elem.as_ref() }
    }
}

/// Fixed-capacity buffer with in-place construction and guaranteed teardown
/// of exactly the constructed prefix.
///
/// A naive allocate-fill-use-free sequence is correct only on the happy
/// path. This type keeps a constructed-count next to the raw storage so that
/// on *every* exit path the constructed slots are dropped exactly once, in
/// construction order, and the storage is released: after normal completion,
/// after a panic from an initializer (only the prefix built so far is
/// dropped), or after a panic from whatever used the buffer in between.
pub(crate) struct DecorationBuf<A> {
    ptr: NonNull<A>,
    capacity: usize,
    initialized: usize,
}

impl<A> DecorationBuf<A> {
    /// Acquires storage for `capacity` slots, all uninitialized. A failed
    /// allocation panics with nothing constructed, so there is no partial
    /// state to release.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let ptr = if capacity == 0 || mem::size_of::<A>() == 0 {
            // Nothing to allocate; the dangling pointer is valid for
            // zero-sized accesses.
            NonNull::dangling()
        } else {
            let layout = Layout::array::<A>(capacity).unwrap();
            // SAFETY: `layout` has non-zero size.
            let alloc_ptr = unsafe { alloc::alloc(layout) };
            if alloc_ptr.is_null() {
                panic!("Unable to allocate memory for sort");
            }
            // SAFETY: just checked for null.
            unsafe { NonNull::new_unchecked(alloc_ptr.cast()) }
        };

        Self {
            ptr,
            capacity,
            initialized: 0,
        }
    }

    /// Constructs the next slot in place. The constructed count advances
    /// only after `init` returns, so a panicking initializer leaves the
    /// buffer owning exactly the slots built before it.
    pub(crate) fn push_with(&mut self, init: impl FnOnce() -> A) {
        assert!(self.initialized < self.capacity);

        let value = init();
        // SAFETY: the slot is in bounds and not yet initialized.
        unsafe { ptr::write(self.ptr.as_ptr().add(self.initialized), value) };
        self.initialized += 1;
    }

    pub(crate) fn len(&self) -> usize {
        self.initialized
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [A] {
        // SAFETY: the first `initialized` slots are constructed.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.initialized) }
    }
}

impl<A> Drop for DecorationBuf<A> {
    fn drop(&mut self) {
        // SAFETY: drops the constructed prefix in construction order, then
        // releases the storage. The zero-size cases never allocated.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.initialized,
            ));
            if self.capacity != 0 && mem::size_of::<A>() != 0 {
                alloc::dealloc(
                    self.ptr.as_ptr().cast(),
                    Layout::array::<A>(self.capacity).unwrap(),
                );
            }
        }
    }
}

/// [`SortOps`] view over the association buffer: ordering decisions go
/// through the stable comparator, swaps are forwarded to the anchored
/// elements. Reordering decorated slots reorders the real sequence.
pub(crate) struct DecoratedOps<'a, T, C, P> {
    assocs: &'a mut [Association<T>],
    compare: StableCompare<C, P>,
}

impl<'a, T, C, P> DecoratedOps<'a, T, C, P> {
    pub(crate) fn new(assocs: &'a mut [Association<T>], compare: StableCompare<C, P>) -> Self {
        Self { assocs, compare }
    }
}

impl<T, C, P> SortOps for DecoratedOps<'_, T, C, P>
where
    P: Projection<T>,
    C: FnMut(&P::Key, &P::Key) -> bool,
{
    fn len(&self) -> usize {
        self.assocs.len()
    }

    fn is_less(&mut self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.assocs[a], &self.assocs[b]);
        // SAFETY: every association anchors a live element of the input
        // slice for the whole sort invocation, and no mutable reference to
        // the slice exists while the sorter runs.
        let (va, vb) = unsafe { (a.value(), b.value()) };
        self.compare.is_less((va, a.pos()), (vb, b.pos()))
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        // Exchange the underlying elements through the fixed anchors, then
        // let the position tags travel with the values they decorate.
        // SAFETY: distinct in-bounds slots anchor distinct elements.
        unsafe {
            ptr::swap_nonoverlapping(
                self.assocs[a].elem.as_ptr(),
                self.assocs[b].elem.as_ptr(),
                1,
            );
        }
        let pos_a = self.assocs[a].pos;
        self.assocs[a].pos = self.assocs[b].pos;
        self.assocs[b].pos = pos_a;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use super::*;

    struct Tally(Rc<Cell<usize>>);

    impl Drop for Tally {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn construct_destruct_counts() {
        for n in [0usize, 1, 2, 8, 33] {
            let drops = Rc::new(Cell::new(0));

            let mut buf = DecorationBuf::with_capacity(n);
            for _ in 0..n {
                buf.push_with(|| Tally(Rc::clone(&drops)));
            }
            assert_eq!(buf.len(), n);
            assert_eq!(drops.get(), 0);

            drop(buf);
            assert_eq!(drops.get(), n);
        }
    }

    #[test]
    fn teardown_after_partial_construction() {
        let drops = Rc::new(Cell::new(0));
        let constructed = Cell::new(0usize);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut buf = DecorationBuf::with_capacity(8);
            for i in 0..8 {
                buf.push_with(|| {
                    if i == 5 {
                        panic!("decoration failure");
                    }
                    constructed.set(constructed.get() + 1);
                    Tally(Rc::clone(&drops))
                });
            }
        }));

        assert!(result.is_err());
        // Slot 5 never advanced the constructed count; only the prefix built
        // before the failure is dropped.
        assert_eq!(constructed.get(), 5);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn constructed_prefix_is_usable_in_order() {
        let mut buf = DecorationBuf::with_capacity(5);
        for i in 0..5 {
            buf.push_with(|| i * 10);
        }
        assert_eq!(buf.as_mut_slice(), &mut [0, 10, 20, 30, 40]);
    }

    #[test]
    fn zero_capacity_allocates_nothing() {
        let mut buf: DecorationBuf<u64> = DecorationBuf::with_capacity(0);
        assert_eq!(buf.len(), 0);
        assert!(buf.as_mut_slice().is_empty());
    }

    #[test]
    fn zero_sized_elements() {
        let mut buf = DecorationBuf::with_capacity(4);
        for _ in 0..4 {
            buf.push_with(|| ());
        }
        assert_eq!(buf.as_mut_slice().len(), 4);
    }

    #[test]
    #[should_panic]
    fn push_past_capacity() {
        let mut buf = DecorationBuf::with_capacity(1);
        buf.push_with(|| 1u8);
        buf.push_with(|| 2u8);
    }
}
