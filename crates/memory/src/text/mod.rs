//! Strings, string views and string builders
//!
//! - [`StringBuf`]: owned, growable, always NUL-terminated
//! - [`Str`]: borrowed `{len, ptr}` view, never allocates
//! - [`StringBuilder`]: append-only buffer materialized into a [`StringBuf`]

pub mod ascii;
mod builder;
mod format;
mod string;
mod view;

pub use builder::StringBuilder;
pub use string::StringBuf;
pub use view::Str;
