//! Public macros for keel-memory

/// Check a caller contract, aborting the current thread on violation.
///
/// Contract violations are programming errors, not recoverable conditions:
/// the failure is logged through `tracing` with the condition, file and line,
/// then the macro panics with the same information.
///
/// # Examples
/// ```
/// use keel_memory::contract;
///
/// let stride = core::mem::size_of::<u32>();
/// contract!(stride > 0);
/// contract!(stride == 4, "unexpected stride {}", stride);
/// ```
#[macro_export]
macro_rules! contract {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::macros::contract_failed(stringify!($cond), file!(), line!(), None);
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::macros::contract_failed(
                stringify!($cond),
                file!(),
                line!(),
                Some(format_args!($($arg)+)),
            );
        }
    };
}

#[doc(hidden)]
#[cold]
#[track_caller]
pub fn contract_failed(
    cond: &'static str,
    file: &'static str,
    line: u32,
    message: Option<core::fmt::Arguments<'_>>,
) -> ! {
    match message {
        Some(message) => {
            tracing::error!(%file, line, condition = cond, %message, "contract violated");
            panic!("[Assertion failed] {file}:{line} {cond} | {message}");
        }
        None => {
            tracing::error!(%file, line, condition = cond, "contract violated");
            panic!("[Assertion failed] {file}:{line} {cond}");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn passing_contract_is_silent() {
        contract!(1 + 1 == 2);
        contract!(true, "never shown {}", 1);
    }

    #[test]
    #[should_panic(expected = "[Assertion failed]")]
    fn failing_contract_panics() {
        let len = 3usize;
        contract!(len == 0);
    }

    #[test]
    #[should_panic(expected = "index 7 out of range")]
    fn failing_contract_carries_message() {
        let index = 7;
        contract!(index < 3, "index {} out of range", index);
    }
}
