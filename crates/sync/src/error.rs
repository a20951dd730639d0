//! Error types for keel-sync

use keel_memory::MemoryError;
use thiserror::Error;

/// Synchronization and worker pool errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to spawn thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread '{name}' panicked")]
    JoinFailed { name: String },

    #[error(transparent)]
    Allocation(#[from] MemoryError),

    #[error("Worker pool is shutting down")]
    Stopped,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SyncError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "SYNC:THREAD:SPAWN",
            Self::JoinFailed { .. } => "SYNC:THREAD:JOIN",
            Self::Allocation(_) => "SYNC:ALLOC",
            Self::Stopped => "SYNC:POOL:STOPPED",
            Self::InvalidConfig { .. } => "SYNC:CONFIG:INVALID",
        }
    }

    pub fn spawn(name: &str, source: std::io::Error) -> Self {
        tracing::warn!(thread = name, error = %source, "thread spawn failed");
        Self::Spawn {
            name: name.to_string(),
            source,
        }
    }

    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
