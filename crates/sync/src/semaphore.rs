//! Counting semaphore

use parking_lot::{Condvar, Mutex};

/// Counter that `wait` decrements, blocking while it is zero.
#[derive(Debug, Default)]
pub struct Semaphore {
    count: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub const fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Adds `n` to the count and wakes up to `n` waiters.
    pub fn post(&self, n: usize) {
        if n == 0 {
            return;
        }
        let mut count = self.count.lock();
        *count = count.saturating_add(n);
        if n == 1 {
            self.available.notify_one();
        } else {
            self.available.notify_all();
        }
    }

    /// Blocks until the count is positive, then decrements it.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Decrements the count if that can be done without blocking.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    pub fn count(&self) -> usize {
        *self.count.lock()
    }
}
