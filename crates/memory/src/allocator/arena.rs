//! Fixed-capacity bump arena
//!
//! One contiguous block is acquired from a parent allocator when the arena is
//! created. Allocation moves a cursor forward; individual frees are ignored
//! and memory comes back only through [`Arena::reset`] / [`Allocator::free_all`]
//! or when the arena itself is dropped.
//!
//! # Safety
//!
//! - Every issued block lies inside `[base, base + max_size)`
//! - The cursor only moves forward between resets, so issued blocks never overlap
//! - The backing block is released to the parent exactly once, in `Drop`

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;

use super::traits::dangling_for;
use super::{AllocError, AllocResult, Allocator};

/// Alignment of the backing block.
const BLOCK_ALIGN: usize = 16;

/// Bump allocator over a single block borrowed from a parent allocator.
///
/// Single-threaded: the cursor lives in a [`Cell`], so an arena is `!Sync`.
pub struct Arena<P: Allocator> {
    parent: P,
    base: NonNull<u8>,
    max_size: usize,
    cursor: Cell<usize>,
}

impl<P: Allocator> Arena<P> {
    /// Creates an arena that owns `max_size` bytes taken from `parent`.
    ///
    /// The block is acquired eagerly; failure is reported, not retried.
    pub fn new(parent: P, max_size: usize) -> AllocResult<Self> {
        let layout = Self::block_layout(max_size)?;
        // SAFETY: layout is valid; the block is released in Drop with the same layout.
        let block = unsafe { parent.allocate(layout)? };
        let base = block.cast::<u8>();

        // SAFETY: the block is max_size bytes long and exclusively ours.
        unsafe { base.as_ptr().write_bytes(0, max_size) };

        tracing::debug!(target: "keel_memory::arena", max_size, "arena created");
        Ok(Self {
            parent,
            base,
            max_size,
            cursor: Cell::new(0),
        })
    }

    fn block_layout(max_size: usize) -> AllocResult<Layout> {
        Layout::from_size_align(max_size, BLOCK_ALIGN)
            .map_err(|_| AllocError::size_overflow("arena block layout"))
    }

    /// Bytes issued since creation or the last reset, padding included.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.cursor.get()
    }

    /// Bytes still available, `max_size - allocated`.
    #[inline]
    pub fn available(&self) -> usize {
        self.max_size - self.cursor.get()
    }

    /// Total capacity of the backing block.
    #[inline]
    pub fn mem_size(&self) -> usize {
        self.max_size
    }

    /// Returns the parent allocator.
    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// Zeroes the backing block and rewinds the cursor.
    ///
    /// Requires exclusive access, so no container can still reference arena memory.
    pub fn reset(&mut self) {
        // SAFETY: &mut self proves no outstanding borrows of issued blocks.
        unsafe { self.rewind(true) };
    }

    /// Releases the backing block to the parent.
    pub fn destroy(self) {
        drop(self);
    }

    /// Offset of the first byte of a `layout` request, or `None` if it does not fit.
    fn bump(&self, layout: Layout) -> Option<usize> {
        let cursor = self.cursor.get();
        let addr = (self.base.as_ptr() as usize).checked_add(cursor)?;
        let padding = addr.wrapping_neg() & (layout.align() - 1);
        let start = cursor.checked_add(padding)?;
        let end = start.checked_add(layout.size())?;
        if end > self.max_size {
            return None;
        }
        self.cursor.set(end);
        Some(start)
    }

    unsafe fn rewind(&self, clear: bool) {
        if clear {
            // SAFETY: base is valid for max_size bytes; caller guarantees no live blocks.
            unsafe { self.base.as_ptr().write_bytes(0, self.max_size) };
        }
        tracing::trace!(
            target: "keel_memory::arena",
            released = self.cursor.get(),
            clear,
            "arena rewound"
        );
        self.cursor.set(0);
    }
}

// SAFETY: blocks are carved from the arena's own region and never overlap
// until a reset, which the caller must order after the last use.
unsafe impl<P: Allocator> Allocator for Arena<P> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            return Ok(dangling_for(layout));
        }
        match self.bump(layout) {
            // SAFETY: start + size <= max_size, so the pointer stays inside the block.
            Some(start) => {
                let ptr = unsafe { self.base.add(start) };
                Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
            }
            None => Err(AllocError::arena_exhausted(layout.size(), self.available())),
        }
    }

    #[inline]
    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    unsafe fn free_all(&self, clear: bool) {
        // SAFETY: forwarded contract, no issued block is used afterwards.
        unsafe { self.rewind(clear) };
    }
}

impl<P: Allocator> Drop for Arena<P> {
    fn drop(&mut self) {
        if let Ok(layout) = Self::block_layout(self.max_size) {
            // SAFETY: base was allocated from parent with exactly this layout.
            unsafe { self.parent.deallocate(self.base, layout) };
        }
        tracing::debug!(target: "keel_memory::arena", max_size = self.max_size, "arena destroyed");
    }
}

// SAFETY: the arena exclusively owns its block; moving it moves that ownership.
unsafe impl<P: Allocator + Send> Send for Arena<P> {}

impl<P: Allocator> fmt::Debug for Arena<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("allocated", &self.allocated())
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::SystemAllocator;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn layout(size: usize, align: usize) -> Layout {
        Layout::from_size_align(size, align).unwrap()
    }

    #[test]
    fn oversized_request_fails_then_exact_fit_succeeds() {
        let arena = Arena::new(SystemAllocator, 4096).unwrap();
        let err = unsafe { arena.allocate(layout(4097, 1)) }.unwrap_err();
        assert!(matches!(
            err,
            AllocError::ArenaExhausted {
                requested: 4097,
                available: 4096
            }
        ));
        assert_eq!(arena.allocated(), 0);

        unsafe { arena.allocate(layout(4096, 1)) }.unwrap();
        assert_eq!(arena.available(), 0);
    }

    #[rstest]
    #[case(1)]
    #[case(8)]
    #[case(64)]
    fn blocks_are_aligned(#[case] align: usize) {
        let arena = Arena::new(SystemAllocator, 1024).unwrap();
        unsafe { arena.allocate(layout(3, 1)) }.unwrap();
        let block = unsafe { arena.allocate(layout(16, align)) }.unwrap();
        assert_eq!(block.cast::<u8>().as_ptr() as usize % align, 0);
        assert!(arena.allocated() >= 19);
    }

    #[test]
    fn deallocate_is_noop() {
        let arena = Arena::new(SystemAllocator, 128).unwrap();
        let l = layout(32, 8);
        let block = unsafe { arena.allocate(l) }.unwrap();
        unsafe { arena.deallocate(block.cast(), l) };
        assert_eq!(arena.allocated(), 32);
    }

    #[test]
    fn reset_zeroes_and_rewinds() {
        let mut arena = Arena::new(SystemAllocator, 64).unwrap();
        let block = unsafe { arena.allocate(layout(64, 1)) }.unwrap().cast::<u8>();
        unsafe { block.as_ptr().write_bytes(0xAB, 64) };

        arena.reset();
        assert_eq!(arena.allocated(), 0);

        let again = unsafe { arena.allocate(layout(64, 1)) }.unwrap().cast::<u8>();
        let bytes = unsafe { core::slice::from_raw_parts(again.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn free_all_without_clear_keeps_contents() {
        let arena = Arena::new(SystemAllocator, 16).unwrap();
        let block = unsafe { arena.allocate(layout(16, 1)) }.unwrap().cast::<u8>();
        unsafe { block.as_ptr().write_bytes(7, 16) };
        unsafe { arena.free_all(false) };
        assert_eq!(arena.available(), 16);
        let again = unsafe { arena.allocate(layout(16, 1)) }.unwrap().cast::<u8>();
        assert_eq!(unsafe { *again.as_ptr() }, 7);
    }

    #[test]
    fn reallocate_copies_into_fresh_block() {
        let arena = Arena::new(SystemAllocator, 64).unwrap();
        let old = layout(4, 1);
        let ptr = unsafe { arena.allocate(old) }.unwrap().cast::<u8>();
        unsafe { ptr.as_ptr().copy_from_nonoverlapping(b"abcd".as_ptr(), 4) };

        let new = layout(8, 1);
        let moved = unsafe { arena.reallocate(ptr, old, new) }.unwrap().cast::<u8>();
        assert_ne!(moved, ptr);
        assert_eq!(unsafe { core::slice::from_raw_parts(moved.as_ptr(), 4) }, b"abcd");
        assert_eq!(arena.allocated(), 12);
    }

    #[test]
    fn nested_arena_draws_from_parent_arena() {
        let outer = Arena::new(SystemAllocator, 256).unwrap();
        {
            let inner = Arena::new(&outer, 128).unwrap();
            assert_eq!(outer.allocated(), 128);
            unsafe { inner.allocate(layout(100, 1)) }.unwrap();
            assert!(unsafe { inner.allocate(layout(100, 1)) }.is_err());
        }
        assert!(Arena::new(&outer, 200).is_err());
    }
}
