//! Allocator-aware containers

mod array;
mod queue;

pub use array::DynArray;
pub use queue::Queue;
