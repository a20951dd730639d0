//! Growable array over a pluggable allocator

use core::fmt;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr;
use core::slice;

use crate::allocator::{AllocError, AllocResult, Allocator, SystemAllocator};
use crate::buffer::{RawBuffer, grow_formula};

/// Contiguous growable array whose storage comes from `A`.
///
/// Appending grows capacity by `max(cap * 2, cap + n)` when space runs out.
/// If growth fails the array keeps its previous contents and capacity.
pub struct DynArray<T, A: Allocator = SystemAllocator> {
    buf: RawBuffer<T, A>,
    len: usize,
}

impl<T, A: Allocator> DynArray<T, A> {
    /// Empty array; no allocation happens until the first element arrives.
    pub fn new_in(alloc: A) -> Self {
        Self {
            buf: RawBuffer::new_in(alloc),
            len: 0,
        }
    }

    /// Array with room for `cap` elements.
    pub fn with_capacity_in(cap: usize, alloc: A) -> AllocResult<Self> {
        Ok(Self {
            buf: RawBuffer::with_capacity_in(cap, alloc)?,
            len: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Free slots before the next growth.
    #[inline]
    pub fn available(&self) -> usize {
        self.buf.capacity() - self.len
    }

    /// Size of one element in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        mem::size_of::<T>()
    }

    /// Bytes of backing storage.
    #[inline]
    pub fn mem_size(&self) -> usize {
        self.buf.mem_size()
    }

    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Grows capacity by exactly `additional`.
    pub fn grow(&mut self, additional: usize) -> AllocResult<()> {
        self.buf.grow_exact(additional)
    }

    /// Capacity the growth formula yields for `additional` more slots.
    pub fn next_capacity(&self, additional: usize) -> Option<usize> {
        grow_formula(self.capacity(), additional)
    }

    /// Grows capacity to `max(cap * 2, cap + additional)` whether or not
    /// free space remains. On failure the array is unchanged.
    pub fn grow_formula(&mut self, additional: usize) -> AllocResult<()> {
        let cap = self.capacity();
        let new_cap = grow_formula(cap, additional)
            .ok_or_else(|| AllocError::size_overflow("array growth"))?;
        self.buf.grow_exact(new_cap - cap)
    }

    /// Ensures at least `additional` free slots.
    pub fn ensure_available(&mut self, additional: usize) -> AllocResult<()> {
        self.buf.reserve(self.len, additional)
    }

    /// Appends `value`, growing if needed.
    ///
    /// On allocation failure the value is dropped and the array is unchanged.
    pub fn push(&mut self, value: T) -> AllocResult<()> {
        self.ensure_available(1)?;
        // SAFETY: len < capacity after the reserve above.
        unsafe { self.buf.as_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Removes the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot len was initialized and is now outside the live range.
        Some(unsafe { self.buf.as_ptr().add(self.len).read() })
    }

    /// Removes the element at `index`, filling the hole with the last element.
    pub fn swap_remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let base = self.buf.as_ptr();
        self.len -= 1;
        // SAFETY: index and len are both initialized slots; after the read the
        // last slot is moved into the hole and leaves the live range.
        unsafe {
            let value = base.add(index).read();
            if index != self.len {
                ptr::copy_nonoverlapping(base.add(self.len), base.add(index), 1);
            }
            Some(value)
        }
    }

    /// Drops every element, keeping capacity.
    pub fn clear(&mut self) {
        let live: *mut [T] = ptr::slice_from_raw_parts_mut(self.buf.as_ptr(), self.len);
        self.len = 0;
        // SAFETY: the slice covered exactly the initialized elements.
        unsafe { ptr::drop_in_place(live) };
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first len slots are initialized; ptr is aligned and non-null.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, with unique access through &mut self.
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
    }
}

impl<T: Clone, A: Allocator> DynArray<T, A> {
    /// Appends clones of every element in `items`.
    pub fn extend_from_slice(&mut self, items: &[T]) -> AllocResult<()> {
        self.ensure_available(items.len())?;
        for item in items {
            // SAFETY: reserved above, len < capacity.
            unsafe { self.buf.as_ptr().add(self.len).write(item.clone()) };
            self.len += 1;
        }
        Ok(())
    }
}

impl<T, A: Allocator> Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: Allocator> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{Arena, TrackingAllocator};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    #[test]
    fn push_grows_by_formula() {
        let mut arr = DynArray::with_capacity_in(2, SystemAllocator).unwrap();
        for i in 0..3 {
            arr.push(i).unwrap();
        }
        assert_eq!(arr.capacity(), 4);
        assert_eq!(arr.as_slice(), &[0, 1, 2]);
        assert_eq!(arr.available(), 1);
        assert_eq!(arr.stride(), 4);
        assert_eq!(arr.mem_size(), 16);
    }

    #[test]
    fn grow_formula_grows_even_with_room() {
        let mut arr = DynArray::with_capacity_in(4, SystemAllocator).unwrap();
        arr.extend_from_slice(&[1u16, 2]).unwrap();
        assert_eq!(arr.next_capacity(1), Some(8));
        arr.grow_formula(1).unwrap();
        assert_eq!(arr.capacity(), 8);
        arr.grow_formula(20).unwrap();
        assert_eq!(arr.capacity(), 28);
        assert_eq!(arr.as_slice(), &[1, 2]);
    }

    #[test]
    fn pop_and_swap_remove() {
        let mut arr = DynArray::new_in(SystemAllocator);
        arr.extend_from_slice(&['a', 'b', 'c', 'd']).unwrap();
        assert_eq!(arr.swap_remove(1), Some('b'));
        assert_eq!(&*arr, &['a', 'd', 'c']);
        assert_eq!(arr.swap_remove(9), None);
        assert_eq!(arr.pop(), Some('c'));
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn elements_are_dropped() {
        let marker = Rc::new(());
        {
            let mut arr = DynArray::new_in(SystemAllocator);
            for _ in 0..5 {
                arr.push(Rc::clone(&marker)).unwrap();
            }
            assert_eq!(Rc::strong_count(&marker), 6);
            drop(arr.pop());
            assert_eq!(Rc::strong_count(&marker), 5);
        }
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn full_arena_push_fails_without_losing_contents() {
        let arena = Arena::new(SystemAllocator, 16).unwrap();
        let mut arr = DynArray::<u32, _>::with_capacity_in(4, &arena).unwrap();
        arr.extend_from_slice(&[1, 2, 3, 4]).unwrap();
        assert!(arr.push(5).is_err());
        assert_eq!(arr.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(arr.capacity(), 4);
    }

    #[test]
    fn storage_returns_to_tracker() {
        let tracker = TrackingAllocator::new(SystemAllocator, "array");
        {
            let mut arr = DynArray::new_in(&tracker);
            for i in 0..100u64 {
                arr.push(i).unwrap();
            }
            assert_eq!(arr[99], 99);
        }
        assert!(tracker.stats().is_balanced());
        assert!(tracker.stats().resize_count > 0);
    }
}
