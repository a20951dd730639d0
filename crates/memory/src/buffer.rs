//! Raw growable storage shared by every container
//!
//! [`RawBuffer`] owns `{ptr, capacity, allocator}` and nothing else: it never
//! reads or drops elements, that is the owning container's job. All growth
//! funnels through [`grow_formula`] and [`Allocator::reallocate`], and a
//! failed growth leaves the buffer exactly as it was.
//!
//! # Safety
//!
//! - `ptr` is valid for `capacity` elements whenever `capacity > 0`
//! - `ptr` is dangling and never dereferenced when `capacity == 0`
//! - The block is always released through the allocator that produced it

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use crate::allocator::{AllocError, AllocResult, Allocator};
use crate::contract;

/// Capacity after growing a container of capacity `cap` that needs `additional`
/// more free slots: `max(cap * 2, cap + additional)`.
#[inline]
pub fn grow_formula(cap: usize, additional: usize) -> Option<usize> {
    let doubled = cap.checked_mul(2)?;
    let needed = cap.checked_add(additional)?;
    Some(doubled.max(needed))
}

/// Owning handle to `capacity` slots of `T` obtained from `A`.
pub struct RawBuffer<T, A: Allocator> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T, A: Allocator> RawBuffer<T, A> {
    /// Empty buffer; performs no allocation.
    pub fn new_in(alloc: A) -> Self {
        contract!(
            mem::size_of::<T>() != 0,
            "zero-sized element types are not supported"
        );
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Buffer with room for exactly `cap` elements.
    pub fn with_capacity_in(cap: usize, alloc: A) -> AllocResult<Self> {
        let mut buf = Self::new_in(alloc);
        if cap > 0 {
            buf.resize_to(cap)?;
        }
        Ok(buf)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Bytes held by the buffer: `capacity * size_of::<T>()`.
    #[inline]
    pub fn mem_size(&self) -> usize {
        self.cap * mem::size_of::<T>()
    }

    /// Grows capacity by exactly `additional` elements.
    pub fn grow_exact(&mut self, additional: usize) -> AllocResult<()> {
        if additional == 0 {
            return Ok(());
        }
        let new_cap = self
            .cap
            .checked_add(additional)
            .ok_or_else(|| AllocError::size_overflow("grow"))?;
        self.resize_to(new_cap)
    }

    /// Makes room for `additional` elements past `len`, growing by
    /// [`grow_formula`] when the free space is short.
    pub fn reserve(&mut self, len: usize, additional: usize) -> AllocResult<()> {
        if self.cap - len >= additional {
            return Ok(());
        }
        let new_cap = grow_formula(self.cap, additional)
            .ok_or_else(|| AllocError::size_overflow("reserve"))?;
        self.resize_to(new_cap)
    }

    fn layout_for(cap: usize) -> AllocResult<Layout> {
        Layout::array::<T>(cap).map_err(|_| AllocError::size_overflow("buffer layout"))
    }

    fn resize_to(&mut self, new_cap: usize) -> AllocResult<()> {
        let new_layout = Self::layout_for(new_cap)?;
        let block = if self.cap == 0 {
            // SAFETY: layout is valid and non-zero sized.
            unsafe { self.alloc.allocate(new_layout)? }
        } else {
            let old_layout = Self::layout_for(self.cap)?;
            // SAFETY: ptr was allocated by alloc with old_layout; alignment is unchanged.
            unsafe {
                self.alloc
                    .reallocate(self.ptr.cast(), old_layout, new_layout)?
            }
        };
        self.ptr = block.cast();
        self.cap = new_cap;
        Ok(())
    }
}

impl<T, A: Allocator> Drop for RawBuffer<T, A> {
    fn drop(&mut self) {
        if self.cap == 0 {
            return;
        }
        if let Ok(layout) = Self::layout_for(self.cap) {
            // SAFETY: ptr was allocated by alloc with this layout.
            unsafe { self.alloc.deallocate(self.ptr.cast(), layout) };
        }
    }
}

// SAFETY: the buffer uniquely owns its block, like Box<[T]>.
unsafe impl<T: Send, A: Allocator + Send> Send for RawBuffer<T, A> {}
// SAFETY: shared access only hands out shared pointers to T.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawBuffer<T, A> {}

impl<T, A: Allocator> fmt::Debug for RawBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("capacity", &self.cap)
            .field("stride", &mem::size_of::<T>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{Arena, SystemAllocator, TrackingAllocator};
    use rstest::rstest;

    #[rstest]
    #[case(0, 1, 1)]
    #[case(4, 1, 8)]
    #[case(4, 10, 14)]
    #[case(16, 16, 32)]
    fn formula(#[case] cap: usize, #[case] n: usize, #[case] expected: usize) {
        assert_eq!(grow_formula(cap, n), Some(expected));
    }

    #[test]
    fn formula_overflow_is_none() {
        assert_eq!(grow_formula(usize::MAX, 1), None);
    }

    #[test]
    fn empty_buffer_allocates_nothing() {
        let tracker = TrackingAllocator::new(SystemAllocator, "raw");
        {
            let buf = RawBuffer::<u64, _>::with_capacity_in(0, &tracker).unwrap();
            assert_eq!(buf.capacity(), 0);
        }
        assert_eq!(tracker.stats().alloc_count, 0);
    }

    #[test]
    fn reserve_uses_formula_and_releases_on_drop() {
        let tracker = TrackingAllocator::new(SystemAllocator, "raw");
        {
            let mut buf = RawBuffer::<u32, _>::with_capacity_in(4, &tracker).unwrap();
            buf.reserve(4, 1).unwrap();
            assert_eq!(buf.capacity(), 8);
            buf.reserve(4, 2).unwrap();
            assert_eq!(buf.capacity(), 8);
            buf.grow_exact(3).unwrap();
            assert_eq!(buf.capacity(), 11);
            assert_eq!(buf.mem_size(), 44);
        }
        assert!(tracker.stats().is_balanced());
    }

    #[test]
    fn failed_growth_keeps_previous_state() {
        let arena = Arena::new(SystemAllocator, 64).unwrap();
        let mut buf = RawBuffer::<u8, _>::with_capacity_in(32, &arena).unwrap();
        unsafe { buf.as_ptr().write(9) };
        let before = buf.as_ptr();

        assert!(buf.reserve(32, 1).is_err());
        assert_eq!(buf.capacity(), 32);
        assert_eq!(buf.as_ptr(), before);
        assert_eq!(unsafe { buf.as_ptr().read() }, 9);
    }

    #[test]
    #[should_panic(expected = "zero-sized")]
    fn zero_sized_elements_are_rejected() {
        let _ = RawBuffer::<(), _>::new_in(SystemAllocator);
    }
}
