//! Error types for keel-memory
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. Allocation
//! failure is always reported through [`MemoryError`]; contract violations
//! (misuse by the caller) go through [`contract!`](crate::contract) instead.

use core::alloc::Layout;
use thiserror::Error;

// ============================================================================
// Main Error Types
// ============================================================================

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation Errors ---
    #[error("Memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    #[error("Invalid memory layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    // --- Arena Errors ---
    #[error("Arena exhausted: requested {requested} bytes, available {available}")]
    ArenaExhausted { requested: usize, available: usize },

    // --- Text Errors ---
    #[error("Cannot parse {input:?} as {kind}")]
    Parse { input: String, kind: &'static str },

    #[error("Formatting failed: {reason}")]
    Format { reason: String },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// An exhausted arena becomes usable again after a reset; everything else
    /// is final for the given request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ArenaExhausted { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::InvalidLayout { .. } => "MEM:ALLOC:LAYOUT",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::ArenaExhausted { .. } => "MEM:ARENA:EXHAUSTED",
            Self::Parse { .. } => "MEM:TEXT:PARSE",
            Self::Format { .. } => "MEM:TEXT:FORMAT",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        tracing::warn!(size, align, "memory allocation failed");
        Self::AllocationFailed { size, align }
    }

    /// Create allocation failed error from layout
    pub fn allocation_failed_with_layout(layout: Layout) -> Self {
        Self::allocation_failed(layout.size(), layout.align())
    }

    /// Create invalid layout error
    pub fn invalid_layout(reason: &str) -> Self {
        Self::InvalidLayout {
            reason: reason.to_string(),
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create arena exhausted error
    pub fn arena_exhausted(requested: usize, available: usize) -> Self {
        tracing::debug!(requested, available, "arena exhausted");
        Self::ArenaExhausted {
            requested,
            available,
        }
    }

    /// Create parse error for a string view conversion
    pub fn parse(input: &[u8], kind: &'static str) -> Self {
        Self::Parse {
            input: String::from_utf8_lossy(input).into_owned(),
            kind,
        }
    }

    /// Create format error for a failing or unstable `Display` impl
    pub fn format(reason: &str) -> Self {
        Self::Format {
            reason: reason.to_string(),
        }
    }
}

impl From<core::alloc::LayoutError> for MemoryError {
    fn from(_: core::alloc::LayoutError) -> Self {
        Self::invalid_layout("size or alignment out of range")
    }
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Allocator-facing name for [`MemoryError`]
pub type AllocError = MemoryError;

/// Allocator-facing name for [`MemoryResult`]
pub type AllocResult<T> = MemoryResult<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            MemoryError::allocation_failed(8, 8).code(),
            "MEM:ALLOC:FAILED"
        );
        assert_eq!(
            MemoryError::arena_exhausted(4097, 4096).code(),
            "MEM:ARENA:EXHAUSTED"
        );
        assert_eq!(MemoryError::parse(b"x", "u64").code(), "MEM:TEXT:PARSE");
        assert_eq!(MemoryError::format("x").code(), "MEM:TEXT:FORMAT");
    }

    #[test]
    fn only_arena_exhaustion_is_retryable() {
        assert!(MemoryError::arena_exhausted(1, 0).is_retryable());
        assert!(!MemoryError::size_overflow("grow").is_retryable());
    }

    #[test]
    fn display_mentions_sizes() {
        let err = MemoryError::arena_exhausted(4097, 4096);
        assert_eq!(
            err.to_string(),
            "Arena exhausted: requested 4097 bytes, available 4096"
        );
    }

    #[test]
    fn layout_error_converts() {
        let err: MemoryError = Layout::from_size_align(8, 3).unwrap_err().into();
        assert_eq!(err.code(), "MEM:ALLOC:LAYOUT");
    }
}
