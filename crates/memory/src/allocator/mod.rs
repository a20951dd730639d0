//! Pluggable allocators
//!
//! Every container in this crate is generic over [`Allocator`]. Three
//! implementations ship with it:
//! - [`SystemAllocator`]: the process heap
//! - [`Arena`]: a fixed-size bump region carved from a parent allocator
//! - [`TrackingAllocator`]: forwards to a parent and counts what passes through

mod arena;
mod system;
mod tracking;
mod traits;

pub use crate::error::{AllocError, AllocResult};
pub use arena::Arena;
pub use system::SystemAllocator;
pub use tracking::{TrackingAllocator, TrackingStats};
pub use traits::Allocator;
