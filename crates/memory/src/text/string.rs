//! Owned, NUL-terminated byte strings
//!
//! ## Invariants
//!
//! - The backing buffer holds `capacity + 1` bytes
//! - The byte at offset `len` is always `0`, rewritten after every mutation
//! - A failed operation leaves content, length and capacity unchanged

use core::cmp::Ordering;
use core::ffi::CStr;
use core::fmt;
use core::ptr;
use core::slice;

use super::format::{format_into, formatted_len};
use super::view::{self, Str};
use crate::allocator::{AllocError, AllocResult, Allocator, SystemAllocator};
use crate::buffer::{RawBuffer, grow_formula};

/// Growable byte string backed by an allocator.
///
/// Contents are arbitrary bytes; [`StringBuf::as_str`] checks UTF-8 on demand.
pub struct StringBuf<A: Allocator = SystemAllocator> {
    buf: RawBuffer<u8, A>,
    len: usize,
}

impl<A: Allocator> StringBuf<A> {
    /// Empty string with room for `cap` bytes plus the terminator.
    pub fn with_capacity_in(cap: usize, alloc: A) -> AllocResult<Self> {
        let raw = cap
            .checked_add(1)
            .ok_or_else(|| AllocError::size_overflow("string capacity"))?;
        let mut s = Self {
            buf: RawBuffer::with_capacity_in(raw, alloc)?,
            len: 0,
        };
        s.terminate();
        Ok(s)
    }

    pub fn new_in(alloc: A) -> AllocResult<Self> {
        Self::with_capacity_in(0, alloc)
    }

    pub fn from_bytes_in(bytes: &[u8], alloc: A) -> AllocResult<Self> {
        let mut s = Self::with_capacity_in(bytes.len(), alloc)?;
        s.push_within_capacity(bytes);
        Ok(s)
    }

    pub fn from_str_in(s: &str, alloc: A) -> AllocResult<Self> {
        Self::from_bytes_in(s.as_bytes(), alloc)
    }

    pub fn from_view_in(view: Str<'_>, alloc: A) -> AllocResult<Self> {
        Self::from_bytes_in(view.as_bytes(), alloc)
    }

    /// Copies at most `n` bytes of `view`.
    pub fn from_view_n_in(view: Str<'_>, n: usize, alloc: A) -> AllocResult<Self> {
        Self::from_view_in(view.substr_to(n), alloc)
    }

    /// Renders `args` into a new string sized exactly to fit.
    pub fn from_fmt_in(alloc: A, args: fmt::Arguments<'_>) -> AllocResult<Self> {
        let mut s = Self::with_capacity_in(formatted_len(args)?, alloc)?;
        s.append_fmt(args)?;
        Ok(s)
    }

    pub fn from_display_in(value: &impl fmt::Display, alloc: A) -> AllocResult<Self> {
        Self::from_fmt_in(alloc, format_args!("{value}"))
    }

    /// `"true"` or `"false"`.
    pub fn from_bool_in(value: bool, alloc: A) -> AllocResult<Self> {
        Self::from_str_in(if value { "true" } else { "false" }, alloc)
    }

    pub fn from_u64_in(value: u64, alloc: A) -> AllocResult<Self> {
        Self::from_fmt_in(alloc, format_args!("{value}"))
    }

    pub fn from_i64_in(value: i64, alloc: A) -> AllocResult<Self> {
        Self::from_fmt_in(alloc, format_args!("{value}"))
    }

    /// Fixed notation with six decimals, e.g. `3.500000`.
    pub fn from_f64_in(value: f64, alloc: A) -> AllocResult<Self> {
        Self::from_fmt_in(alloc, format_args!("{value:.6}"))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that fit before the next growth, terminator excluded.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity() - 1
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.len
    }

    /// Bytes held by the backing buffer, terminator slot included.
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

    /// Ensures at least `additional` free bytes, growing by
    /// `max(cap * 2, cap + additional)` when short.
    pub fn ensure_available(&mut self, additional: usize) -> AllocResult<()> {
        if self.available() >= additional {
            return Ok(());
        }
        let cap = self.capacity();
        let new_cap = grow_formula(cap, additional)
            .ok_or_else(|| AllocError::size_overflow("string growth"))?;
        self.buf.grow_exact(new_cap - cap)
    }

    /// Replaces the contents with `bytes`.
    pub fn set(&mut self, bytes: &[u8]) -> AllocResult<()> {
        if bytes.len() > self.capacity() {
            self.grow(bytes.len() - self.capacity())?;
        }
        self.len = 0;
        self.push_within_capacity(bytes);
        Ok(())
    }

    pub fn set_view(&mut self, view: Str<'_>) -> AllocResult<()> {
        self.set(view.as_bytes())
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> AllocResult<()> {
        self.ensure_available(bytes.len())?;
        self.push_within_capacity(bytes);
        Ok(())
    }

    pub fn append<B: Allocator>(&mut self, other: &StringBuf<B>) -> AllocResult<()> {
        self.append_bytes(other.as_bytes())
    }

    pub fn append_str(&mut self, s: &str) -> AllocResult<()> {
        self.append_bytes(s.as_bytes())
    }

    pub fn append_view(&mut self, view: Str<'_>) -> AllocResult<()> {
        self.append_bytes(view.as_bytes())
    }

    /// Appends a single byte.
    pub fn append_char(&mut self, c: u8) -> AllocResult<()> {
        self.append_bytes(&[c])
    }

    /// Appends the UTF-8 encoding of `rune`.
    pub fn append_rune(&mut self, rune: char) -> AllocResult<()> {
        let mut encoded = [0u8; 4];
        self.append_bytes(rune.encode_utf8(&mut encoded).as_bytes())
    }

    /// Appends rendered `args`; on failure nothing is appended.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> AllocResult<()> {
        let needed = formatted_len(args)?;
        self.ensure_available(needed)?;
        let spare = self.spare_mut();
        let written = format_into(spare, args)?;
        self.len += written;
        self.terminate();
        Ok(())
    }

    /// Empties the string, keeping capacity.
    pub fn reset(&mut self) {
        self.len = 0;
        self.terminate();
    }

    /// True when no NUL byte appears before the terminator.
    pub fn is_valid(&self) -> bool {
        !self.as_bytes().contains(&0)
    }

    pub fn compare(&self, other: Str<'_>) -> Ordering {
        view::compare(self.as_bytes(), other.as_bytes())
    }

    pub fn compare_n(&self, other: Str<'_>, n: usize) -> Ordering {
        view::compare_n(self.as_bytes(), other.as_bytes(), n)
    }

    pub fn compare_ci(&self, other: Str<'_>) -> Ordering {
        view::compare_ci(self.as_bytes(), other.as_bytes())
    }

    pub fn compare_ci_n(&self, other: Str<'_>, n: usize) -> Ordering {
        view::compare_ci_n(self.as_bytes(), other.as_bytes(), n)
    }

    pub fn utf8_len(&self) -> usize {
        view::utf8_len_n(self.as_bytes(), usize::MAX)
    }

    pub fn utf8_len_n(&self, n: usize) -> usize {
        view::utf8_len_n(self.as_bytes(), n)
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the first len bytes are initialized.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    /// Contents followed by the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        // SAFETY: len + 1 <= raw capacity and the terminator is always written.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len + 1) }
    }

    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// Borrow as a C string; `None` if an interior NUL is present.
    pub fn as_cstr(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(self.as_bytes_with_nul()).ok()
    }

    pub fn as_view(&self) -> Str<'_> {
        Str::from_bytes(self.as_bytes())
    }

    /// View of at most the first `n` bytes.
    pub fn as_view_n(&self, n: usize) -> Str<'_> {
        self.as_view().substr_to(n)
    }

    fn spare_mut(&mut self) -> &mut [u8] {
        let spare = self.capacity() - self.len;
        // SAFETY: [len, capacity) lies inside the buffer and is not aliased.
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr().add(self.len), spare) }
    }

    /// Copies `bytes` after the current contents; capacity must already fit.
    fn push_within_capacity(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.available());
        // SAFETY: available() >= bytes.len(); source may not alias our spare bytes
        // because &mut self excludes outstanding borrows of them.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.buf.as_ptr().add(self.len), bytes.len());
        }
        self.len += bytes.len();
        self.terminate();
    }

    #[inline]
    fn terminate(&mut self) {
        // SAFETY: raw capacity is always at least len + 1.
        unsafe { self.buf.as_ptr().add(self.len).write(0) };
    }
}

impl<A: Allocator, B: Allocator> PartialEq<StringBuf<B>> for StringBuf<A> {
    fn eq(&self, other: &StringBuf<B>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: Allocator> Eq for StringBuf<A> {}

impl<A: Allocator> PartialOrd for StringBuf<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Allocator> Ord for StringBuf<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other.as_view())
    }
}

impl<A: Allocator> PartialEq<str> for StringBuf<A> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: Allocator> PartialEq<&str> for StringBuf<A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: Allocator> fmt::Debug for StringBuf<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl<A: Allocator> fmt::Display for StringBuf<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<'a, A: Allocator> From<&'a StringBuf<A>> for Str<'a> {
    fn from(s: &'a StringBuf<A>) -> Self {
        s.as_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{Arena, TrackingAllocator};
    use crate::error::MemoryError;
    use pretty_assertions::assert_eq;

    fn sys(s: &str) -> StringBuf {
        StringBuf::from_str_in(s, SystemAllocator).unwrap()
    }

    #[test]
    fn failing_display_is_a_format_error() {
        struct Broken;
        impl fmt::Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let mut s = StringBuf::from_str_in("keep", SystemAllocator).unwrap();
        let cap = s.capacity();
        let err = s.append_fmt(format_args!("{}{}", Broken, "x".repeat(64))).unwrap_err();
        assert_eq!(err.code(), "MEM:TEXT:FORMAT");
        assert_eq!(s.as_bytes_with_nul(), b"keep\0");
        assert_eq!(s.capacity(), cap);

        let err = StringBuf::from_display_in(&Broken, SystemAllocator).unwrap_err();
        assert!(matches!(err, MemoryError::Format { .. }));
    }

    #[test]
    fn terminator_follows_every_mutation() {
        let mut s = StringBuf::with_capacity_in(2, SystemAllocator).unwrap();
        assert_eq!(s.as_bytes_with_nul(), b"\0");
        s.append_str("ab").unwrap();
        assert_eq!(s.as_bytes_with_nul(), b"ab\0");
        s.append_char(b'c').unwrap();
        assert_eq!(s.as_bytes_with_nul(), b"abc\0");
        s.set(b"x").unwrap();
        assert_eq!(s.as_bytes_with_nul(), b"x\0");
        s.reset();
        assert_eq!(s.as_bytes_with_nul(), b"\0");
    }

    #[test]
    fn append_grows_by_formula() {
        let mut s = StringBuf::with_capacity_in(4, SystemAllocator).unwrap();
        s.append_str("abcd").unwrap();
        s.append_str("e").unwrap();
        assert_eq!(s.capacity(), 8);
        s.append_str("0123456789").unwrap();
        assert_eq!(s.capacity(), 18);
        assert_eq!(s, "abcde0123456789");
    }

    #[test]
    fn append_rune_encodes_utf8() {
        let mut s = sys("ab");
        s.append_rune('\u{15b}').unwrap();
        assert_eq!(s.as_bytes(), b"ab\xc5\x9b");
        assert_eq!(s.utf8_len(), 3);
    }

    #[test]
    fn formatted_construction_is_exact() {
        let s = StringBuf::from_fmt_in(SystemAllocator, format_args!("{}-{}", "a", 42)).unwrap();
        assert_eq!(s, "a-42");
        assert_eq!(s.capacity(), 4);
    }

    #[test]
    fn number_conversions() {
        assert_eq!(StringBuf::from_bool_in(true, SystemAllocator).unwrap(), "true");
        assert_eq!(StringBuf::from_u64_in(u64::MAX, SystemAllocator).unwrap(), "18446744073709551615");
        assert_eq!(StringBuf::from_i64_in(-7, SystemAllocator).unwrap(), "-7");
        assert_eq!(StringBuf::from_f64_in(3.5, SystemAllocator).unwrap(), "3.500000");
    }

    #[test]
    fn compares_like_views() {
        let a = sys("testaa");
        let b = sys("test");
        assert_eq!(a.compare(b.as_view()), Ordering::Greater);
        assert_eq!(b.compare(a.as_view()), Ordering::Less);
        assert!(b < a);
        assert_eq!(sys("ABC").compare_ci(Str::new("abc")), Ordering::Equal);
        assert_eq!(a.compare_n(b.as_view(), 4), Ordering::Equal);
    }

    #[test]
    fn failure_leaves_content_unchanged() {
        let arena = Arena::new(SystemAllocator, 8).unwrap();
        let mut s = StringBuf::from_str_in("abc", &arena).unwrap();
        let before = s.capacity();
        assert!(s.append_str("this will not fit").is_err());
        assert_eq!(s, "abc");
        assert_eq!(s.capacity(), before);
        assert_eq!(s.as_bytes_with_nul(), b"abc\0");
    }

    #[test]
    fn interior_nul_is_not_valid() {
        let mut s = sys("ok");
        assert!(s.is_valid());
        assert!(s.as_cstr().is_some());
        s.append_bytes(b"\0x").unwrap();
        assert!(!s.is_valid());
        assert!(s.as_cstr().is_none());
    }

    #[test]
    fn views_borrow_contents() {
        let s = sys("hello world");
        assert_eq!(s.as_view_n(5), "hello");
        assert_eq!(Str::from(&s).substr_from(6), "world");
        let copy = StringBuf::from_view_n_in(s.as_view(), 5, SystemAllocator).unwrap();
        assert_eq!(copy, "hello");
    }

    #[test]
    fn memory_returns_to_allocator() {
        let tracker = TrackingAllocator::new(SystemAllocator, "string");
        {
            let mut s = StringBuf::new_in(&tracker).unwrap();
            for i in 0..50 {
                s.append_fmt(format_args!("{i},")).unwrap();
            }
            assert!(s.len() > 50);
        }
        assert!(tracker.stats().is_balanced());
    }
}
