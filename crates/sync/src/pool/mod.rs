//! Fixed-size worker pool
//!
//! Tasks are queued in a FIFO [`Queue`] and taken by whichever worker wakes
//! first. All pool state lives behind one [`Mutex`]; workers sleep on
//! `work_available` and [`WorkerPool::join`] sleeps on `all_idle`.
//!
//! Tasks run outside the lock and cannot be cancelled once queued. Shutting
//! down drains the queue before the workers are told to exit.

mod config;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use keel_memory::allocator::{Allocator, SystemAllocator};
use keel_memory::collections::{DynArray, Queue};
use tracing::{debug, error, trace};

use crate::condvar::Condition;
use crate::error::{SyncError, SyncResult};
use crate::mutex::Mutex;
use crate::thread::Thread;

pub use config::{MIN_STACK_SIZE, PoolConfig};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState<A: Allocator> {
    queue: RefCell<Queue<Task, A>>,
    working: Cell<usize>,
    panicked: Cell<usize>,
    stop: Cell<bool>,
}

impl<A: Allocator> PoolState<A> {
    fn is_idle(&self) -> bool {
        self.working.get() == 0 && self.queue.borrow().is_empty()
    }
}

struct Shared<A: Allocator> {
    state: Mutex<PoolState<A>>,
    work_available: Condition,
    all_idle: Condition,
}

/// Bounded set of threads executing queued closures.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use keel_memory::allocator::SystemAllocator;
/// use keel_sync::WorkerPool;
///
/// let pool = WorkerPool::new(SystemAllocator, 4)?;
/// let hits = Arc::new(AtomicUsize::new(0));
/// for _ in 0..32 {
///     let hits = Arc::clone(&hits);
///     pool.add_task(move || {
///         hits.fetch_add(1, Ordering::Relaxed);
///     })?;
/// }
/// pool.join();
/// assert_eq!(hits.load(Ordering::Relaxed), 32);
/// # Ok::<(), keel_sync::SyncError>(())
/// ```
pub struct WorkerPool<A = SystemAllocator>
where
    A: Allocator + Clone + Send + 'static,
{
    shared: Arc<Shared<A>>,
    threads: DynArray<Thread, A>,
    config: PoolConfig,
}

impl<A> WorkerPool<A>
where
    A: Allocator + Clone + Send + 'static,
{
    /// Starts `workers` threads with default settings otherwise.
    pub fn new(alloc: A, workers: usize) -> SyncResult<Self> {
        Self::with_config(alloc, PoolConfig::new(workers))
    }

    /// Starts a pool described by `config`.
    ///
    /// If any worker fails to start, the ones already running are stopped
    /// and joined before the error is returned.
    pub fn with_config(alloc: A, config: PoolConfig) -> SyncResult<Self> {
        config.validate()?;

        let queue = Queue::with_capacity_in(config.queue_capacity, alloc.clone())?;
        let threads = DynArray::with_capacity_in(config.workers, alloc)?;
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: RefCell::new(queue),
                working: Cell::new(0),
                panicked: Cell::new(0),
                stop: Cell::new(false),
            }),
            work_available: Condition::new(),
            all_idle: Condition::new(),
        });

        let mut pool = Self {
            shared,
            threads,
            config,
        };
        for index in 0..pool.config.workers {
            // A thread that cannot be stored would be joined while still waiting.
            pool.threads.ensure_available(1)?;
            let shared = Arc::clone(&pool.shared);
            let thread = Thread::spawn(
                pool.config.thread_name(index),
                pool.config.stack_size,
                move || worker_loop(&shared),
            )?;
            pool.threads.push(thread)?;
        }

        debug!(
            workers = pool.config.workers,
            prefix = %pool.config.thread_name_prefix,
            "worker pool started"
        );
        Ok(pool)
    }

    /// Queues `task` and wakes one idle worker.
    ///
    /// Fails with [`SyncError::Stopped`] once shutdown has begun, or with
    /// [`SyncError::Allocation`] if the queue could not grow.
    pub fn add_task<F>(&self, task: F) -> SyncResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let state = self.shared.state.lock();
        if state.stop.get() {
            return Err(SyncError::Stopped);
        }
        state.queue.borrow_mut().enqueue(Box::new(task))?;
        self.shared.work_available.signal();
        Ok(())
    }

    /// Blocks until the queue is empty and no worker is running a task.
    ///
    /// The pool stays usable afterwards. Calling this from inside a task
    /// never returns, since that task counts as running.
    pub fn join(&self) {
        let mut state = self.shared.state.lock();
        debug!(
            pending = state.queue.borrow().len(),
            working = state.working.get(),
            "waiting for worker pool to go idle"
        );
        while !state.stop.get() && !state.is_idle() {
            state = self.shared.all_idle.wait(state);
        }
        debug!("worker pool idle");
    }

    /// Drains the queue, stops every worker and joins it. Later calls to
    /// [`add_task`](Self::add_task) fail with [`SyncError::Stopped`].
    pub fn shutdown(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.join();
        {
            let state = self.shared.state.lock();
            state.stop.set(true);
            self.shared.work_available.broadcast();
        }

        while let Some(mut thread) = self.threads.pop() {
            if let Err(e) = thread.join() {
                error!(thread = thread.name(), error = %e, "worker exited abnormally");
            }
        }
        debug!(
            prefix = %self.config.thread_name_prefix,
            panicked = self.panicked(),
            "worker pool stopped"
        );
    }

    /// Shuts the pool down and releases its queue and thread array.
    pub fn destroy(mut self) {
        self.shutdown();
    }

    /// Number of live worker threads.
    pub fn workers(&self) -> usize {
        self.threads.len()
    }

    /// Tasks queued but not yet picked up.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().queue.borrow().len()
    }

    /// Tasks currently executing.
    pub fn working(&self) -> usize {
        self.shared.state.lock().working.get()
    }

    /// Tasks that ended in a panic so far.
    pub fn panicked(&self) -> usize {
        self.shared.state.lock().panicked.get()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stop.get()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl<A> Drop for WorkerPool<A>
where
    A: Allocator + Clone + Send + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<A> fmt::Debug for WorkerPool<A>
where
    A: Allocator + Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers())
            .field("pending", &self.pending())
            .field("working", &self.working())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

fn worker_loop<A: Allocator>(shared: &Shared<A>) {
    debug!("worker waiting for tasks");
    loop {
        let task = {
            let mut state = shared.state.lock();
            while state.queue.borrow().is_empty() && !state.stop.get() {
                state = shared.work_available.wait(state);
            }
            if state.stop.get() {
                break;
            }
            let Some(task) = state.queue.borrow_mut().dequeue() else {
                continue;
            };
            state.working.set(state.working.get() + 1);
            task
        };

        trace!("task started");
        let outcome = panic::catch_unwind(AssertUnwindSafe(task));
        trace!(panicked = outcome.is_err(), "task finished");

        let state = shared.state.lock();
        if let Err(payload) = outcome {
            state.panicked.set(state.panicked.get() + 1);
            error!(panic = panic_message(payload.as_ref()), "task panicked");
        }
        state.working.set(state.working.get() - 1);
        if !state.stop.get() && state.is_idle() {
            shared.all_idle.broadcast();
        }
    }
    debug!("worker exiting");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn accessors_on_idle_pool() {
        let pool = WorkerPool::new(SystemAllocator, 2).unwrap();
        assert_eq!(pool.workers(), 2);
        assert_eq!(pool.pending(), 0);
        assert_eq!(pool.working(), 0);
        assert!(!pool.is_stopped());
        pool.join();
    }

    #[test]
    fn invalid_config_fails_before_spawning() {
        let err = WorkerPool::new(SystemAllocator, 0).unwrap_err();
        assert_eq!(err.code(), "SYNC:CONFIG:INVALID");
    }

    #[test]
    fn shutdown_rejects_new_tasks() {
        let mut pool = WorkerPool::new(SystemAllocator, 1).unwrap();
        pool.shutdown();
        assert!(pool.is_stopped());
        assert_eq!(pool.workers(), 0);
        let err = pool.add_task(|| {}).unwrap_err();
        assert!(matches!(err, SyncError::Stopped));
        pool.shutdown();
    }

    #[test]
    fn panicking_task_is_counted() {
        let pool = WorkerPool::new(SystemAllocator, 2).unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        pool.add_task(|| panic!("task failure")).unwrap();
        for _ in 0..4 {
            let done = Arc::clone(&done);
            pool.add_task(move || {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.join();
        assert_eq!(pool.panicked(), 1);
        assert_eq!(done.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(s.as_ref()), "non-string panic payload");
    }
}
