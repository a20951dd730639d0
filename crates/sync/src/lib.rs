//! # keel-sync
//!
//! Thread primitives and a bounded worker pool on top of keel-memory.
//!
//! - [`Mutex`]: recursive lock whose guard remembers its mutex
//! - [`Condition`]: wait/signal/broadcast paired with [`Mutex`]
//! - [`Semaphore`]: counting semaphore
//! - [`Thread`]: named thread handle that joins on drop
//! - [`WorkerPool`]: fixed set of workers draining a FIFO task queue whose
//!   storage comes from a pluggable [`Allocator`](keel_memory::allocator::Allocator)
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`PoolConfig`]

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod condvar;
pub mod error;
pub mod mutex;
pub mod pool;
pub mod semaphore;
pub mod thread;

pub use crate::condvar::Condition;
pub use crate::error::{SyncError, SyncResult};
pub use crate::mutex::{Mutex, MutexGuard};
pub use crate::pool::{PoolConfig, WorkerPool};
pub use crate::semaphore::Semaphore;
pub use crate::thread::Thread;

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::{
        Condition, Mutex, MutexGuard, PoolConfig, Semaphore, SyncError, SyncResult, Thread,
        WorkerPool,
    };
}
