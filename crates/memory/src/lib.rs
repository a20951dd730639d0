//! # keel-memory
//!
//! Pluggable allocators and the containers built on them.
//!
//! Every container takes its allocator as a type parameter and routes all
//! allocation, growth and release through it:
//! - [`allocator`]: the [`Allocator`](allocator::Allocator) trait plus system,
//!   arena and tracking implementations
//! - [`collections`]: [`DynArray`](collections::DynArray) and
//!   [`Queue`](collections::Queue)
//! - [`text`]: [`StringBuf`](text::StringBuf), [`Str`](text::Str) and
//!   [`StringBuilder`](text::StringBuilder)
//!
//! ## Quick Start
//!
//! ```rust
//! use keel_memory::prelude::*;
//!
//! let arena = Arena::new(SystemAllocator, 4096)?;
//! let mut names = DynArray::new_in(&arena);
//! names.push(StringBuf::from_str_in("alpha", &arena)?)?;
//! names.push(StringBuf::from_str_in("beta", &arena)?)?;
//! assert_eq!(names[1], "beta");
//! # Ok::<(), keel_memory::MemoryError>(())
//! ```
//!
//! ## Failure model
//!
//! Running out of memory is an ordinary [`MemoryError`]: containers keep their
//! previous contents and capacity when growth fails. Caller bugs such as
//! zero-sized element types trip [`contract!`] instead.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for configuration types

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod allocator;
pub mod buffer;
pub mod collections;
pub mod config;
pub mod error;
#[doc(hidden)]
pub mod macros;
pub mod text;

pub use crate::config::TrackingConfig;
pub use crate::error::{AllocError, AllocResult, MemoryError, MemoryResult};

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::allocator::{
        Allocator, Arena, SystemAllocator, TrackingAllocator, TrackingStats,
    };
    pub use crate::collections::{DynArray, Queue};
    pub use crate::contract;
    pub use crate::error::{AllocResult, MemoryError, MemoryResult};
    pub use crate::text::{Str, StringBuf, StringBuilder};
}
