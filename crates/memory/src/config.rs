//! Configuration for allocator wrappers

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for a [`TrackingAllocator`](crate::allocator::TrackingAllocator).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackingConfig {
    /// Name attached to every emitted event
    pub name: String,

    /// Emit a debug event for every allocator call
    pub log_operations: bool,
}

impl TrackingConfig {
    /// Configuration with the given name and per-call logging enabled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Enable or disable the per-call debug events.
    pub fn with_log_operations(mut self, enabled: bool) -> Self {
        self.log_operations = enabled;
        self
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            name: "tracking".to_string(),
            log_operations: true,
        }
    }
}
