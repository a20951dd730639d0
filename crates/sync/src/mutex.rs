//! Recursive mutex
//!
//! The owning thread may lock again without deadlocking; the lock is released
//! when the last guard goes away. Guards only hand out `&T`, so shared state
//! that must change under the lock uses `Cell`/`RefCell` inside.

use core::fmt;
use core::ops::Deref;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Re-entrant mutual exclusion around a value.
pub struct Mutex<T> {
    inner: ReentrantMutex<T>,
}

/// Proof that the current thread holds a [`Mutex`].
///
/// Remembers which mutex it came from so [`Condition::wait`](crate::Condition::wait)
/// can release and reacquire it.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a, T> {
    guard: ReentrantMutexGuard<'a, T>,
    mutex: &'a Mutex<T>,
}

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: ReentrantMutex::new(value),
        }
    }

    /// Blocks until the lock is held by the current thread.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        MutexGuard {
            guard: self.inner.lock(),
            mutex: self,
        }
    }

    /// Takes the lock only if no other thread holds it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock().map(|guard| MutexGuard { guard, mutex: self })
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    pub fn is_owned_by_current_thread(&self) -> bool {
        self.inner.is_owned_by_current_thread()
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

impl<'a, T> MutexGuard<'a, T> {
    /// The mutex this guard holds.
    pub fn mutex(this: &Self) -> &'a Mutex<T> {
        this.mutex
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn same_thread_can_relock() {
        let mutex = Mutex::new(Cell::new(0));
        let outer = mutex.lock();
        outer.set(1);
        {
            let inner = mutex.lock();
            inner.set(inner.get() + 1);
        }
        assert_eq!(outer.get(), 2);
        assert!(mutex.is_owned_by_current_thread());
        drop(outer);
        assert!(!mutex.is_locked());
    }

    #[test]
    fn other_thread_cannot_try_lock() {
        let mutex = Arc::new(Mutex::new(()));
        let guard = mutex.lock();
        let remote = Arc::clone(&mutex);
        let taken = thread::spawn(move || remote.try_lock().is_some())
            .join()
            .unwrap();
        assert!(!taken);
        drop(guard);
        assert!(mutex.try_lock().is_some());
    }

    #[test]
    fn counter_is_consistent_across_threads() {
        let mutex = Arc::new(Mutex::new(Cell::new(0u32)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let guard = mutex.lock();
                        guard.set(guard.get() + 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(mutex.lock().get(), 8000);
    }
}
