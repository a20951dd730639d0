//! System allocator implementation
//!
//! Delegates to the process-wide system heap. Blocks are handed out zeroed.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;

use super::traits::dangling_for;
use super::{AllocError, AllocResult, Allocator};

/// Wrapper for the system's default allocator
///
/// Stateless and freely copyable. Thread-safe because the platform heap is.
/// Bulk release is not supported: [`Allocator::free_all`] is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates a new SystemAllocator
    #[inline]
    pub const fn new() -> Self {
        SystemAllocator
    }
}

unsafe impl Allocator for SystemAllocator {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            return Ok(dangling_for(layout));
        }

        // SAFETY: layout has non-zero size.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => Ok(NonNull::slice_from_raw_parts(ptr, layout.size())),
            None => Err(AllocError::allocation_failed_with_layout(layout)),
        }
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: ptr came from System with this layout (caller's contract).
        unsafe { System.dealloc(ptr.as_ptr(), layout) };
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> AllocResult<NonNull<[u8]>> {
        if old_layout.size() == 0 {
            // SAFETY: nothing to preserve, fresh block.
            return unsafe { self.allocate(new_layout) };
        }
        if new_layout.size() == 0 {
            // SAFETY: ptr came from System with old_layout.
            unsafe { self.deallocate(ptr, old_layout) };
            return Ok(dangling_for(new_layout));
        }

        // SAFETY: ptr came from System with old_layout, new size is non-zero and
        // alignment is unchanged (caller's contract).
        let new_ptr = unsafe { System.realloc(ptr.as_ptr(), old_layout, new_layout.size()) };
        match NonNull::new(new_ptr) {
            Some(new_ptr) => Ok(NonNull::slice_from_raw_parts(new_ptr, new_layout.size())),
            None => Err(AllocError::allocation_failed_with_layout(new_layout)),
        }
    }
}
