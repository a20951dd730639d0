//! Named OS threads that join on drop

use std::thread::{self, JoinHandle, ThreadId};

use crate::error::{SyncError, SyncResult};

/// Owning handle to a spawned thread.
///
/// Dropping a handle that was neither joined nor detached joins the thread.
#[derive(Debug)]
pub struct Thread {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl Thread {
    /// Spawns `f` on a new thread. `stack_size` of `None` uses the platform
    /// default.
    pub fn spawn<F>(name: impl Into<String>, stack_size: Option<usize>, f: F) -> SyncResult<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        let handle = builder.spawn(f).map_err(|e| SyncError::spawn(&name, e))?;
        tracing::trace!(thread = %name, "thread spawned");
        Ok(Self {
            name,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` once the thread has been joined or detached.
    pub fn id(&self) -> Option<ThreadId> {
        self.handle.as_ref().map(|h| h.thread().id())
    }

    pub fn current_id() -> ThreadId {
        thread::current().id()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Waits for the thread to finish. Joining twice is a no-op.
    pub fn join(&mut self) -> SyncResult<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| SyncError::JoinFailed {
                name: self.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Lets the thread run on without a handle.
    pub fn detach(mut self) {
        self.handle = None;
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            tracing::error!(thread = %self.name, error = %e, "thread ended with a panic");
        }
    }
}
