//! Non-owning string views
//!
//! A [`Str`] borrows bytes from a [`StringBuf`](super::StringBuf), a literal or
//! any other buffer, and never allocates. A view can be *null* (refers to
//! nothing) or *empty* (refers to zero bytes); most operations treat the two
//! alike, but [`Str::is_null`] and [`Str::is_empty`] tell them apart.
//!
//! Comparisons order by length first and by bytes second, so `"testaa"`
//! sorts after `"test"` and `"b"` sorts before `"aa"`.

use core::cmp::Ordering;
use core::ffi::CStr;
use core::fmt;

use super::ascii;
use super::StringBuf;
use crate::allocator::Allocator;
use crate::error::{MemoryError, MemoryResult};

/// Borrowed `{len, ptr}` slice of bytes.
#[derive(Clone, Copy, Default)]
pub struct Str<'a> {
    bytes: Option<&'a [u8]>,
}

impl<'a> Str<'a> {
    pub const fn new(s: &'a str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// View of a NUL-terminated string, terminator excluded.
    pub fn from_cstr(cstr: &'a CStr) -> Self {
        Self::from_bytes(cstr.to_bytes())
    }

    pub fn from_string<A: Allocator>(s: &'a StringBuf<A>) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// View of at most the first `n` bytes of `s`.
    pub fn from_string_n<A: Allocator>(s: &'a StringBuf<A>, n: usize) -> Self {
        Self::from_string(s).substr_to(n)
    }

    /// View that refers to nothing.
    pub const fn null() -> Self {
        Self { bytes: None }
    }

    /// Zero-length view that is not null.
    pub const fn empty() -> Self {
        Self { bytes: Some(&[]) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Viewed bytes; a null view yields an empty slice.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes.unwrap_or_default()
    }

    /// The bytes as UTF-8 text, if they are valid.
    pub fn as_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// Non-null and zero-length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.bytes, Some(b) if b.is_empty())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    #[inline]
    pub fn is_null_or_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Non-null with no interior NUL byte.
    pub fn is_valid_cstr(&self) -> bool {
        self.bytes.is_some_and(|b| !b.contains(&0))
    }

    /// Splits at the first `delim`, returning the part before it and leaving
    /// `self` at the part after it.
    ///
    /// Without a delimiter the whole view is returned and `self` becomes empty.
    pub fn chop_first_split_by(&mut self, delim: Str<'_>) -> Str<'a> {
        match self.index(delim) {
            Some(index) => {
                let bytes = self.as_bytes();
                let head = Str::from_bytes(&bytes[..index]);
                *self = Str::from_bytes(&bytes[index + delim.len()..]);
                head
            }
            None => core::mem::replace(self, Str::empty()),
        }
    }

    /// Splits off everything before the first `\n`.
    pub fn chop_first_line(&mut self) -> Str<'a> {
        self.chop_first_split_by(Str::new("\n"))
    }

    /// Bytes in `[start, end)`, with both bounds clamped into `[0, len]`.
    pub fn substr(&self, start: usize, end: usize) -> Str<'a> {
        let bytes = self.as_bytes();
        let end = end.min(bytes.len());
        if end == 0 || start > end {
            return Str::empty();
        }
        Str::from_bytes(&bytes[start..end])
    }

    pub fn substr_from(&self, start: usize) -> Str<'a> {
        self.substr(start, self.len())
    }

    pub fn substr_to(&self, end: usize) -> Str<'a> {
        self.substr(0, end)
    }

    /// Drops leading bytes while `pred` holds.
    pub fn trim_left_by(&self, pred: impl Fn(u8) -> bool) -> Str<'a> {
        let Some(bytes) = self.bytes else {
            return *self;
        };
        let skip = bytes.iter().take_while(|&&c| pred(c)).count();
        Str::from_bytes(&bytes[skip..])
    }

    /// Drops trailing bytes while `pred` holds.
    pub fn trim_right_by(&self, pred: impl Fn(u8) -> bool) -> Str<'a> {
        let Some(bytes) = self.bytes else {
            return *self;
        };
        let skip = bytes.iter().rev().take_while(|&&c| pred(c)).count();
        Str::from_bytes(&bytes[..bytes.len() - skip])
    }

    pub fn trim_space_left(&self) -> Str<'a> {
        self.trim_left_by(ascii::is_space)
    }

    pub fn trim_space_right(&self) -> Str<'a> {
        self.trim_right_by(ascii::is_space)
    }

    pub fn trim_space(&self) -> Str<'a> {
        self.trim_space_right().trim_space_left()
    }

    /// The view without `prefix`, or an empty view if it does not start with it.
    pub fn trim_prefix(&self, prefix: Str<'_>) -> Str<'a> {
        match self.as_bytes().strip_prefix(prefix.as_bytes()) {
            Some(rest) => Str::from_bytes(rest),
            None => Str::empty(),
        }
    }

    /// The view without `suffix`, or an empty view if it does not end with it.
    pub fn trim_suffix(&self, suffix: Str<'_>) -> Str<'a> {
        match self.as_bytes().strip_suffix(suffix.as_bytes()) {
            Some(rest) => Str::from_bytes(rest),
            None => Str::empty(),
        }
    }

    pub fn has_prefix(&self, prefix: Str<'_>) -> bool {
        self.as_bytes().starts_with(prefix.as_bytes())
    }

    pub fn has_suffix(&self, suffix: Str<'_>) -> bool {
        self.as_bytes().ends_with(suffix.as_bytes())
    }

    pub fn contains(&self, needle: Str<'_>) -> bool {
        self.index(needle).is_some()
    }

    /// Offset of the first occurrence of `needle`.
    pub fn index(&self, needle: Str<'_>) -> Option<usize> {
        let (hay, needle) = (self.as_bytes(), needle.as_bytes());
        if needle.is_empty() {
            return Some(0);
        }
        hay.windows(needle.len()).position(|w| w == needle)
    }

    /// Offset of the first occurrence of byte `c`.
    pub fn index_byte(&self, c: u8) -> Option<usize> {
        self.as_bytes().iter().position(|&b| b == c)
    }

    pub fn compare(&self, other: &Str<'_>) -> Ordering {
        compare(self.as_bytes(), other.as_bytes())
    }

    pub fn compare_n(&self, other: &Str<'_>, n: usize) -> Ordering {
        compare_n(self.as_bytes(), other.as_bytes(), n)
    }

    pub fn compare_ci(&self, other: &Str<'_>) -> Ordering {
        compare_ci(self.as_bytes(), other.as_bytes())
    }

    pub fn compare_ci_n(&self, other: &Str<'_>, n: usize) -> Ordering {
        compare_ci_n(self.as_bytes(), other.as_bytes(), n)
    }

    /// Number of UTF-8 code points, stopping at the first NUL.
    pub fn utf8_len(&self) -> usize {
        utf8_len_n(self.as_bytes(), usize::MAX)
    }

    /// Like [`Str::utf8_len`], counting at most `n` code points.
    pub fn utf8_len_n(&self, n: usize) -> usize {
        utf8_len_n(self.as_bytes(), n)
    }

    /// Accepts `true`, `ok`, `yes`, `false` and `no`.
    pub fn to_bool(&self) -> MemoryResult<bool> {
        match self.as_bytes() {
            b"true" | b"ok" | b"yes" => Ok(true),
            b"false" | b"no" => Ok(false),
            other => Err(MemoryError::parse(other, "bool")),
        }
    }

    /// Parses a run of decimal digits.
    pub fn to_u64(&self) -> MemoryResult<u64> {
        parse_digits(self.as_bytes()).ok_or_else(|| MemoryError::parse(self.as_bytes(), "u64"))
    }

    /// Parses decimal digits with an optional leading `-`.
    pub fn to_i64(&self) -> MemoryResult<i64> {
        let bytes = self.as_bytes();
        let parsed = match bytes.split_first() {
            Some((b'-', digits)) => parse_digits(digits).and_then(|v| {
                if v == i64::MIN.unsigned_abs() {
                    Some(i64::MIN)
                } else {
                    i64::try_from(v).ok().map(|v| -v)
                }
            }),
            _ => parse_digits(bytes).and_then(|v| i64::try_from(v).ok()),
        };
        parsed.ok_or_else(|| MemoryError::parse(bytes, "i64"))
    }
}

fn parse_digits(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u64, |acc, &c| {
        if !ascii::is_digit(c) {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(c - b'0'))
    })
}

pub(crate) fn compare(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

pub(crate) fn compare_n(a: &[u8], b: &[u8], n: usize) -> Ordering {
    if a.len() >= n && b.len() >= n {
        a[..n].cmp(&b[..n])
    } else {
        a.len().cmp(&b.len())
    }
}

fn cmp_ignore_case(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(|&c| ascii::to_lower(c))
        .cmp(b.iter().map(|&c| ascii::to_lower(c)))
}

pub(crate) fn compare_ci(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| cmp_ignore_case(a, b))
}

pub(crate) fn compare_ci_n(a: &[u8], b: &[u8], n: usize) -> Ordering {
    if a.len() >= n && b.len() >= n {
        cmp_ignore_case(&a[..n], &b[..n])
    } else {
        a.len().cmp(&b.len())
    }
}

/// Code points in `bytes` up to the first NUL, at most `n`; zero when a
/// malformed lead byte is met.
pub(crate) fn utf8_len_n(bytes: &[u8], n: usize) -> usize {
    let mut count = 0;
    let mut i = 0;
    while count < n && i < bytes.len() {
        let width = match bytes[i] {
            0 => break,
            0x01..=0x7f => 1,
            b if b & 0xe0 == 0xc0 => 2,
            b if b & 0xf0 == 0xe0 => 3,
            b if b & 0xf8 == 0xf0 => 4,
            _ => return 0,
        };
        i += width;
        count += 1;
    }
    count
}

impl PartialEq for Str<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Str<'_> {}

impl PartialOrd for Str<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Str<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialEq<str> for Str<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Str<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a> From<&'a str> for Str<'a> {
    fn from(s: &'a str) -> Self {
        Str::new(s)
    }
}

impl<'a> From<&'a [u8]> for Str<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Str::from_bytes(bytes)
    }
}

impl fmt::Debug for Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            None => f.write_str("Str(null)"),
            Some(b) => write!(f, "Str({:?})", String::from_utf8_lossy(b)),
        }
    }
}

impl fmt::Display for Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}
