//! Two-pass formatting into fixed spare capacity
//!
//! The first pass measures the rendered length so the caller can grow once;
//! the second writes into the reserved bytes and refuses to overflow them.

use core::fmt::{self, Write};

use crate::error::{MemoryError, MemoryResult};

struct Counter(usize);

impl Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// Rendered byte length of `args`.
///
/// Fails if a `Display` impl reports an error, before the caller grows.
pub(crate) fn formatted_len(args: fmt::Arguments<'_>) -> MemoryResult<usize> {
    let mut counter = Counter(0);
    counter
        .write_fmt(args)
        .map_err(|_| MemoryError::format("Display implementation returned an error"))?;
    Ok(counter.0)
}

/// Writes `args` into `spare`, returning the bytes written.
///
/// Fails if the output no longer fits the measured size.
pub(crate) fn format_into(spare: &mut [u8], args: fmt::Arguments<'_>) -> MemoryResult<usize> {
    struct SpareWriter<'a> {
        spare: &'a mut [u8],
        pos: usize,
    }

    impl Write for SpareWriter<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let end = self.pos.checked_add(s.len()).ok_or(fmt::Error)?;
            let dst = self.spare.get_mut(self.pos..end).ok_or(fmt::Error)?;
            dst.copy_from_slice(s.as_bytes());
            self.pos = end;
            Ok(())
        }
    }

    let mut writer = SpareWriter { spare, pos: 0 };
    writer
        .write_fmt(args)
        .map_err(|_| MemoryError::format("output changed length between passes"))?;
    Ok(writer.pos)
}
