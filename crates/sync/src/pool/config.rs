//! Worker pool configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Smallest stack a worker thread may be given.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Settings for a [`WorkerPool`](super::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Initial task queue capacity; the queue grows past it on demand
    pub queue_capacity: usize,

    /// Workers are named `{prefix}-{index}`
    pub thread_name_prefix: String,

    /// Per-thread stack size, `None` for the platform default
    pub stack_size: Option<usize>,
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Reject settings the pool cannot run with.
    pub fn validate(&self) -> SyncResult<()> {
        if self.workers == 0 {
            return Err(SyncError::invalid_config("workers must be at least 1"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(SyncError::invalid_config("thread name prefix is empty"));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(SyncError::invalid_config(
                "thread name prefix contains a NUL byte",
            ));
        }
        if let Some(size) = self.stack_size
            && size < MIN_STACK_SIZE
        {
            return Err(SyncError::invalid_config(&format!(
                "stack size {size} is below the {MIN_STACK_SIZE} byte minimum"
            )));
        }
        Ok(())
    }

    pub(crate) fn thread_name(&self, index: usize) -> String {
        format!("{}-{index}", self.thread_name_prefix)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(4, usize::from),
            queue_capacity: 16,
            thread_name_prefix: "keel-worker".to_string(),
            stack_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = PoolConfig::new(3);
        assert_eq!(config.workers, 3);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.thread_name_prefix, "keel-worker");
        assert_eq!(config.stack_size, None);
        assert!(config.validate().is_ok());
        assert_eq!(config.thread_name(2), "keel-worker-2");
    }

    #[rstest]
    #[case::no_workers(PoolConfig::new(0))]
    #[case::empty_prefix(PoolConfig::new(2).with_thread_name_prefix(""))]
    #[case::nul_prefix(PoolConfig::new(2).with_thread_name_prefix("a\0b"))]
    #[case::tiny_stack(PoolConfig::new(2).with_stack_size(1024))]
    fn invalid_configs_are_rejected(#[case] config: PoolConfig) {
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "SYNC:CONFIG:INVALID");
    }

    #[test]
    fn builders_chain() {
        let config = PoolConfig::default()
            .with_workers(5)
            .with_queue_capacity(64)
            .with_thread_name_prefix("io")
            .with_stack_size(MIN_STACK_SIZE);
        assert_eq!(config.workers, 5);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.thread_name(0), "io-0");
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_uses_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"workers": 2, "thread_name_prefix": "net"}"#).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.thread_name_prefix, "net");
    }
}
