//! Condition variable paired with the recursive [`Mutex`]

use parking_lot::Condvar;

use keel_memory::contract;

use crate::mutex::{Mutex, MutexGuard};

/// Wait/notify primitive used together with a [`Mutex`].
///
/// Each `signal`/`broadcast` bumps a generation counter under an internal
/// lock. A waiter records the generation before releasing the user mutex, so
/// a notification sent between the release and the sleep is never lost.
/// Callers still re-check their predicate in a loop.
#[derive(Debug, Default)]
pub struct Condition {
    generation: parking_lot::Mutex<u64>,
    cond: Condvar,
}

impl Condition {
    pub const fn new() -> Self {
        Self {
            generation: parking_lot::Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    /// Atomically releases `guard`, sleeps until notified, then reacquires
    /// the mutex before returning.
    ///
    /// # Panics
    ///
    /// Panics if the current thread still holds the mutex through another
    /// guard, since sleeping would then deadlock every notifier.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        let mutex: &'a Mutex<T> = MutexGuard::mutex(&guard);
        let mut generation = self.generation.lock();
        let observed = *generation;
        drop(guard);

        contract!(
            !mutex.is_owned_by_current_thread(),
            "condition wait with the mutex held recursively"
        );

        while *generation == observed {
            self.cond.wait(&mut generation);
        }
        drop(generation);
        mutex.lock()
    }

    /// Wakes at least one waiter, if any.
    pub fn signal(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.cond.notify_one();
    }

    /// Wakes every current waiter.
    pub fn broadcast(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.cond.notify_all();
    }
}
