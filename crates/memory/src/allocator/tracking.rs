//! Tracking allocator implementation
//!
//! Wraps another allocator, forwards every call unchanged and keeps running
//! totals of what went through it. Each call is reported as a `tracing` debug
//! event on the `keel_memory::tracking` target.
//!
//! ## Invariants
//!
//! - `current_allocated == total_allocated - total_freed` after every call
//! - Failed calls change no byte counters
//! - A resize counts the new size as allocated and the old size as freed

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;

use super::{AllocResult, Allocator};
use crate::config::TrackingConfig;

/// Snapshot of a [`TrackingAllocator`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackingStats {
    pub total_allocated: usize,
    pub total_freed: usize,
    pub current_allocated: usize,
    pub alloc_count: usize,
    pub free_count: usize,
    pub resize_count: usize,
}

impl TrackingStats {
    /// True when every allocated byte has been given back.
    pub fn is_balanced(&self) -> bool {
        self.current_allocated == 0
    }

    fn settle(&mut self) {
        self.current_allocated = self.total_allocated.saturating_sub(self.total_freed);
    }
}

impl fmt::Display for TrackingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total allocated:   {} bytes", self.total_allocated)?;
        writeln!(f, "total freed:       {} bytes", self.total_freed)?;
        writeln!(f, "current allocated: {} bytes", self.current_allocated)?;
        writeln!(f, "allocations:       {}", self.alloc_count)?;
        writeln!(f, "frees:             {}", self.free_count)?;
        write!(f, "resizes:           {}", self.resize_count)
    }
}

/// A wrapper allocator that counts bytes and calls.
///
/// Counters are plain cells, so the tracker is `!Sync`; give each thread its own.
pub struct TrackingAllocator<P> {
    parent: P,
    config: TrackingConfig,
    stats: Cell<TrackingStats>,
}

impl<P: Allocator> TrackingAllocator<P> {
    /// Wraps `parent`, reporting under `name`.
    pub fn new(parent: P, name: impl Into<String>) -> Self {
        Self::with_config(parent, TrackingConfig::new(name))
    }

    /// Wraps `parent` using an explicit configuration.
    pub fn with_config(parent: P, config: TrackingConfig) -> Self {
        Self {
            parent,
            config,
            stats: Cell::new(TrackingStats::default()),
        }
    }

    /// Name used in every emitted event.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Gets a reference to the underlying allocator
    pub fn parent(&self) -> &P {
        &self.parent
    }

    /// Consumes the tracker and returns the underlying allocator
    pub fn into_parent(self) -> P {
        self.parent
    }

    /// Current counters.
    pub fn stats(&self) -> TrackingStats {
        self.stats.get()
    }

    /// Emits the current counters as a single info event.
    pub fn log_summary(&self) {
        let stats = self.stats.get();
        tracing::info!(
            target: "keel_memory::tracking",
            name = %self.config.name,
            total_allocated = stats.total_allocated,
            total_freed = stats.total_freed,
            current_allocated = stats.current_allocated,
            alloc_count = stats.alloc_count,
            free_count = stats.free_count,
            resize_count = stats.resize_count,
            "allocation summary"
        );
    }

    fn update(&self, f: impl FnOnce(&mut TrackingStats)) -> TrackingStats {
        let mut stats = self.stats.get();
        f(&mut stats);
        stats.settle();
        self.stats.set(stats);
        stats
    }

    fn report(&self, op: &'static str, bytes: usize, stats: TrackingStats) {
        if self.config.log_operations {
            tracing::debug!(
                target: "keel_memory::tracking",
                name = %self.config.name,
                op,
                bytes,
                current = stats.current_allocated,
                "tracked allocation"
            );
        }
    }
}

// SAFETY: every call is forwarded to the parent with the same contract;
// bookkeeping has no memory-safety impact.
unsafe impl<P: Allocator> Allocator for TrackingAllocator<P> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: forwarding to parent.
        let block = unsafe { self.parent.allocate(layout)? };
        let stats = self.update(|s| {
            s.total_allocated += layout.size();
            s.alloc_count += 1;
        });
        self.report("alloc", layout.size(), stats);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarding to parent.
        unsafe { self.parent.deallocate(ptr, layout) };
        let stats = self.update(|s| {
            s.total_freed += layout.size();
            s.free_count += 1;
        });
        self.report("free", layout.size(), stats);
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: forwarding to parent; on error the old block is untouched.
        let block = unsafe { self.parent.reallocate(ptr, old_layout, new_layout)? };
        let stats = self.update(|s| {
            s.total_allocated += new_layout.size();
            s.total_freed += old_layout.size();
            s.resize_count += 1;
        });
        self.report("resize", new_layout.size(), stats);
        Ok(block)
    }

    unsafe fn free_all(&self, clear: bool) {
        // SAFETY: forwarding to parent.
        unsafe { self.parent.free_all(clear) };
        let stats = self.update(|s| s.total_freed = s.total_allocated);
        self.report("free_all", 0, stats);
    }
}

impl<P> fmt::Debug for TrackingAllocator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingAllocator")
            .field("name", &self.config.name)
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{Arena, SystemAllocator};
    use pretty_assertions::assert_eq;

    fn layout(size: usize) -> Layout {
        Layout::from_size_align(size, 8).unwrap()
    }

    #[test]
    fn counts_alloc_free_resize() {
        let tracker = TrackingAllocator::new(SystemAllocator, "test");
        unsafe {
            let a = tracker.allocate(layout(32)).unwrap().cast::<u8>();
            let b = tracker.allocate(layout(16)).unwrap().cast::<u8>();
            let a = tracker.reallocate(a, layout(32), layout(64)).unwrap().cast::<u8>();
            tracker.deallocate(b, layout(16));

            assert_eq!(
                tracker.stats(),
                TrackingStats {
                    total_allocated: 112,
                    total_freed: 48,
                    current_allocated: 64,
                    alloc_count: 2,
                    free_count: 1,
                    resize_count: 1,
                }
            );
            tracker.deallocate(a, layout(64));
        }
        assert!(tracker.stats().is_balanced());
    }

    #[test]
    fn failed_allocation_changes_nothing() {
        let arena = Arena::new(SystemAllocator, 16).unwrap();
        let tracker = TrackingAllocator::new(&arena, "arena");
        assert!(unsafe { tracker.allocate(layout(32)) }.is_err());
        assert_eq!(tracker.stats(), TrackingStats::default());
    }

    #[test]
    fn free_all_balances_counters() {
        let arena = Arena::new(SystemAllocator, 256).unwrap();
        let tracker = TrackingAllocator::new(&arena, "bulk");
        unsafe {
            tracker.allocate(layout(40)).unwrap();
            tracker.allocate(layout(24)).unwrap();
            tracker.free_all(true);
        }
        let stats = tracker.stats();
        assert_eq!(stats.total_freed, stats.total_allocated);
        assert_eq!(stats.current_allocated, 0);
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn summary_display_lists_counters() {
        let tracker = TrackingAllocator::new(SystemAllocator, "display");
        let text = tracker.stats().to_string();
        assert!(text.contains("total allocated:   0 bytes"));
        assert!(text.ends_with("resizes:           0"));
        tracker.log_summary();
    }
}
