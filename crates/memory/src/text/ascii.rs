//! ASCII byte classifiers
//!
//! `is_space` also accepts vertical tab and form feed, which
//! [`u8::is_ascii_whitespace`] does not.

#[inline]
pub const fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

#[inline]
pub const fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

#[inline]
pub const fn is_upper(c: u8) -> bool {
    c.is_ascii_uppercase()
}

#[inline]
pub const fn is_lower(c: u8) -> bool {
    c.is_ascii_lowercase()
}

#[inline]
pub const fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

#[inline]
pub const fn is_alphanumeric(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

#[inline]
pub const fn to_lower(c: u8) -> u8 {
    c.to_ascii_lowercase()
}

#[inline]
pub const fn to_upper(c: u8) -> u8 {
    c.to_ascii_uppercase()
}
