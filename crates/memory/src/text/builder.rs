//! Append-only string builder
//!
//! Unlike [`StringBuf`], the builder keeps no terminator while writing; a
//! NUL-terminated copy is produced by [`StringBuilder::to_string`].
//!
//! The inherent `write_fmt` makes `write!` usable directly on a builder, with
//! allocation failure surfacing as the macro's result:
//!
//! ```
//! use keel_memory::allocator::SystemAllocator;
//! use keel_memory::text::StringBuilder;
//!
//! let mut sb = StringBuilder::new_in(SystemAllocator);
//! sb.write_str("total").unwrap();
//! write!(sb, " = {}", 42).unwrap();
//! assert_eq!(sb.as_bytes(), b"total = 42");
//! ```

use core::ffi::CStr;
use core::fmt;
use core::ptr;
use core::slice;

use super::format::{format_into, formatted_len};
use super::{Str, StringBuf};
use crate::allocator::{AllocError, AllocResult, Allocator, SystemAllocator};
use crate::buffer::{RawBuffer, grow_formula};

/// Growable byte buffer with a write cursor.
pub struct StringBuilder<A: Allocator = SystemAllocator> {
    buf: RawBuffer<u8, A>,
    len: usize,
}

impl<A: Allocator> StringBuilder<A> {
    /// Empty builder; nothing is allocated until the first write.
    pub fn new_in(alloc: A) -> Self {
        Self {
            buf: RawBuffer::new_in(alloc),
            len: 0,
        }
    }

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

    #[inline]
    pub fn available(&self) -> usize {
        self.buf.capacity() - self.len
    }

    #[inline]
    pub fn mem_size(&self) -> usize {
        self.buf.mem_size()
    }

    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Grows capacity by exactly `additional` bytes.
    pub fn grow(&mut self, additional: usize) -> AllocResult<()> {
        self.buf.grow_exact(additional)
    }

    /// Capacity the growth formula yields for `additional` more bytes.
    pub fn next_capacity(&self, additional: usize) -> Option<usize> {
        grow_formula(self.capacity(), additional)
    }

    /// Grows capacity to `max(cap * 2, cap + additional)` whether or not
    /// free space remains. On failure the builder is unchanged.
    pub fn grow_formula(&mut self, additional: usize) -> AllocResult<()> {
        let cap = self.capacity();
        let new_cap = grow_formula(cap, additional)
            .ok_or_else(|| AllocError::size_overflow("builder growth"))?;
        self.buf.grow_exact(new_cap - cap)
    }

    /// Ensures at least `additional` free bytes.
    pub fn ensure_available(&mut self, additional: usize) -> AllocResult<()> {
        self.buf.reserve(self.len, additional)
    }

    /// Written bytes so far.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the first len bytes were written.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    pub fn as_view(&self) -> Str<'_> {
        Str::from_bytes(self.as_bytes())
    }

    /// Rewinds the cursor, keeping capacity.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> AllocResult<()> {
        self.ensure_available(bytes.len())?;
        // SAFETY: at least bytes.len() free bytes after the cursor; &mut self
        // rules out bytes aliasing the spare region.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.buf.as_ptr().add(self.len), bytes.len());
        }
        self.len += bytes.len();
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> AllocResult<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Writes one byte.
    pub fn write_char(&mut self, c: u8) -> AllocResult<()> {
        self.write_bytes(&[c])
    }

    /// Writes the UTF-8 encoding of `rune`.
    pub fn write_rune(&mut self, rune: char) -> AllocResult<()> {
        let mut encoded = [0u8; 4];
        self.write_bytes(rune.encode_utf8(&mut encoded).as_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> AllocResult<()> {
        self.write_fmt(format_args!("{value}"))
    }

    pub fn write_i64(&mut self, value: i64) -> AllocResult<()> {
        self.write_fmt(format_args!("{value}"))
    }

    /// Fixed notation with six decimals.
    pub fn write_f64(&mut self, value: f64) -> AllocResult<()> {
        self.write_fmt(format_args!("{value:.6}"))
    }

    pub fn write_cstr(&mut self, cstr: &CStr) -> AllocResult<()> {
        self.write_bytes(cstr.to_bytes())
    }

    /// Writes at most `n` bytes of `cstr`.
    pub fn write_cstr_n(&mut self, cstr: &CStr, n: usize) -> AllocResult<()> {
        self.write_view_n(Str::from_cstr(cstr), n)
    }

    pub fn write_view(&mut self, view: Str<'_>) -> AllocResult<()> {
        self.write_bytes(view.as_bytes())
    }

    /// Writes at most `n` bytes of `view`.
    pub fn write_view_n(&mut self, view: Str<'_>, n: usize) -> AllocResult<()> {
        self.write_view(view.substr_to(n))
    }

    pub fn write_string<B: Allocator>(&mut self, s: &StringBuf<B>) -> AllocResult<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Writes at most `n` bytes of `s`.
    pub fn write_string_n<B: Allocator>(&mut self, s: &StringBuf<B>, n: usize) -> AllocResult<()> {
        self.write_view(s.as_view_n(n))
    }

    /// Writes rendered `args`; on failure nothing is written.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> AllocResult<()> {
        let needed = formatted_len(args)?;
        self.ensure_available(needed)?;
        let spare_len = self.available();
        // SAFETY: [len, capacity) lies inside the buffer and is not aliased.
        let spare = unsafe { slice::from_raw_parts_mut(self.buf.as_ptr().add(self.len), spare_len) };
        let written = format_into(spare, args)?;
        self.len += written;
        Ok(())
    }

    /// Copies the written bytes into a new NUL-terminated string from `alloc`.
    pub fn to_string<B: Allocator>(&self, alloc: B) -> AllocResult<StringBuf<B>> {
        StringBuf::from_bytes_in(self.as_bytes(), alloc)
    }
}

impl<A: Allocator> fmt::Debug for StringBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringBuilder")
            .field("contents", &String::from_utf8_lossy(self.as_bytes()))
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
