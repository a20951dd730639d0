//! The allocator interface every container is written against
//!
//! # Safety
//!
//! [`Allocator`] is an unsafe trait: implementors promise that
//! - returned pointers are valid for reads and writes of `layout.size()` bytes,
//! - returned pointers are aligned to `layout.align()`,
//! - a block stays valid until it is deallocated, reallocated or bulk-released
//!   through [`Allocator::free_all`].
//!
//! The blanket impl for `&A` forwards every call, so contracts carry over.

use core::alloc::Layout;
use core::ptr::{self, NonNull};

use super::AllocResult;

/// Dangling, well-aligned pointer for zero-sized requests.
#[inline]
pub(crate) fn dangling_for(layout: Layout) -> NonNull<[u8]> {
    // SAFETY: alignment is a non-zero power of two, so it is a valid non-null address.
    let ptr = unsafe { NonNull::new_unchecked(ptr::without_provenance_mut::<u8>(layout.align())) };
    NonNull::slice_from_raw_parts(ptr, 0)
}

/// Pluggable memory provider.
///
/// Containers hold an allocator and route every allocation, resize and release
/// through it. Callers track block sizes, so deallocation takes the layout.
///
/// # Safety Requirements
///
/// Implementors must ensure that:
/// - Returned pointers are valid for the requested size until released
/// - Memory is properly aligned according to the layout
/// - A failed call leaves previously issued blocks untouched
pub unsafe trait Allocator {
    /// Allocates a block of at least `layout.size()` bytes.
    ///
    /// Zero-sized requests succeed with a dangling, aligned pointer.
    ///
    /// # Safety
    /// - Memory contents are unspecified unless the implementation says otherwise
    ///
    /// # Errors
    /// - Returns error if the memory cannot be provided
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>>;

    /// Releases a block previously returned by this allocator.
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this allocator
    /// - `layout` must match the layout the block currently has
    /// - After this call, `ptr` becomes invalid and must not be used
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Resizes a block, preserving the first `min(old, new)` bytes.
    ///
    /// On error the original block is untouched and still owned by the caller.
    /// The default implementation allocates, copies and releases.
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this allocator with `old_layout`
    /// - `new_layout.align()` must equal `old_layout.align()`
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: new_layout is valid; contract forwarded from caller.
        let new_ptr = unsafe { self.allocate(new_layout)? };

        let copy_size = old_layout.size().min(new_layout.size());
        if copy_size > 0 {
            // SAFETY: both blocks are at least copy_size bytes long and distinct.
            unsafe {
                ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.cast::<u8>().as_ptr(), copy_size);
            }
        }

        // SAFETY: ptr was allocated by self with old_layout (caller's contract).
        unsafe { self.deallocate(ptr, old_layout) };
        Ok(new_ptr)
    }

    /// Releases every block issued so far in one step.
    ///
    /// `clear` asks the allocator to zero the reclaimed memory. Allocators
    /// without bulk release treat this as a no-op.
    ///
    /// # Safety
    /// - No block issued by this allocator may be used afterwards
    unsafe fn free_all(&self, clear: bool) {
        let _ = clear;
    }
}

// SAFETY: forwards every call to `T`; contracts are preserved through delegation.
unsafe impl<T: Allocator + ?Sized> Allocator for &T {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: forwarding to underlying allocator.
        unsafe { (**self).allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarding to underlying allocator.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: forwarding to underlying allocator.
        unsafe { (**self).reallocate(ptr, old_layout, new_layout) }
    }

    unsafe fn free_all(&self, clear: bool) {
        // SAFETY: forwarding to underlying allocator.
        unsafe { (**self).free_all(clear) }
    }
}
