//! FIFO ring buffer over a pluggable allocator
//!
//! Elements live in a circular window `[head, head + len)` modulo capacity.
//! When growth happens while the window wraps, the segment that starts at
//! `head` is moved to the end of the enlarged buffer so FIFO order survives.

use core::fmt;
use core::ptr;

use crate::allocator::{AllocResult, Allocator, SystemAllocator};
use crate::buffer::RawBuffer;

/// Growable FIFO queue.
///
/// `enqueue` always grows when full and fails only if the allocator does.
pub struct Queue<T, A: Allocator = SystemAllocator> {
    buf: RawBuffer<T, A>,
    head: usize,
    len: usize,
}

impl<T, A: Allocator> Queue<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            buf: RawBuffer::new_in(alloc),
            head: 0,
            len: 0,
        }
    }

    /// Queue with room for `cap` elements before the first growth.
    pub fn with_capacity_in(cap: usize, alloc: A) -> AllocResult<Self> {
        Ok(Self {
            buf: RawBuffer::with_capacity_in(cap, alloc)?,
            head: 0,
            len: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.buf.capacity() - self.len
    }

    #[inline]
    pub fn mem_size(&self) -> usize {
        self.buf.mem_size()
    }

    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Grows capacity by exactly `additional`.
    pub fn grow(&mut self, additional: usize) -> AllocResult<()> {
        let old_cap = self.capacity();
        self.buf.grow_exact(additional)?;
        self.unwrap_after_growth(old_cap);
        Ok(())
    }

    /// Ensures at least `additional` free slots.
    pub fn ensure_available(&mut self, additional: usize) -> AllocResult<()> {
        let old_cap = self.capacity();
        self.buf.reserve(self.len, additional)?;
        self.unwrap_after_growth(old_cap);
        Ok(())
    }

    /// Appends `value` at the back.
    pub fn enqueue(&mut self, value: T) -> AllocResult<()> {
        self.ensure_available(1)?;
        let slot = self.physical(self.len);
        // SAFETY: slot < capacity and is outside the live window.
        unsafe { self.buf.as_ptr().add(slot).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the front element.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: head is the first initialized slot; it leaves the window below.
        let value = unsafe { self.buf.as_ptr().add(self.head).read() };
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(value)
    }

    /// Front element without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: head is initialized while len > 0.
        Some(unsafe { &*self.buf.as_ptr().add(self.head) })
    }

    /// Elements from front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        // SAFETY: every logical index below len maps to an initialized slot.
        (0..self.len).map(move |i| unsafe { &*self.buf.as_ptr().add(self.physical(i)) })
    }

    /// Drops every element, keeping capacity.
    pub fn clear(&mut self) {
        while self.dequeue().is_some() {}
        self.head = 0;
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        let idx = self.head + logical;
        let cap = self.capacity();
        if idx >= cap { idx - cap } else { idx }
    }

    fn unwrap_after_growth(&mut self, old_cap: usize) {
        let new_cap = self.capacity();
        if new_cap == old_cap || self.head + self.len <= old_cap {
            return;
        }
        let head_len = old_cap - self.head;
        let new_head = new_cap - head_len;
        let base = self.buf.as_ptr();
        // SAFETY: both ranges lie inside the new capacity; ptr::copy handles overlap.
        unsafe { ptr::copy(base.add(self.head), base.add(new_head), head_len) };
        self.head = new_head;
    }
}

impl<T, A: Allocator> Drop for Queue<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Queue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{Arena, TrackingAllocator};
    use pretty_assertions::assert_eq;

    #[test]
    fn chars_come_out_in_order() {
        let mut queue = Queue::with_capacity_in(10, SystemAllocator).unwrap();
        for c in 'a'..='j' {
            queue.enqueue(c).unwrap();
        }
        let mut out = String::new();
        while let Some(c) = queue.dequeue() {
            out.push(c);
        }
        assert_eq!(out, "abcdefghij");
        assert!(queue.peek().is_none());
    }

    #[test]
    fn growth_while_wrapped_keeps_order() {
        let mut queue = Queue::with_capacity_in(4, SystemAllocator).unwrap();
        for i in 0..4 {
            queue.enqueue(i).unwrap();
        }
        assert_eq!(queue.dequeue(), Some(0));
        assert_eq!(queue.dequeue(), Some(1));
        queue.enqueue(4).unwrap();
        queue.enqueue(5).unwrap();
        queue.enqueue(6).unwrap();

        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6]);
        assert_eq!(queue.peek(), Some(&2));
    }

    #[test]
    fn exact_growth_while_wrapped_keeps_order() {
        let mut queue = Queue::with_capacity_in(3, SystemAllocator).unwrap();
        queue.enqueue('x').unwrap();
        queue.enqueue('a').unwrap();
        queue.enqueue('b').unwrap();
        queue.dequeue();
        queue.enqueue('c').unwrap();
        queue.grow(1).unwrap();
        queue.enqueue('d').unwrap();
        assert_eq!(queue.iter().collect::<String>(), "abcd");
    }

    #[test]
    fn enqueue_failure_leaves_queue_intact() {
        let arena = Arena::new(SystemAllocator, 8).unwrap();
        let mut queue = Queue::<u16, _>::with_capacity_in(4, &arena).unwrap();
        for i in 0..4 {
            queue.enqueue(i).unwrap();
        }
        assert!(queue.enqueue(99).is_err());
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn drops_pending_elements_and_storage() {
        let tracker = TrackingAllocator::new(SystemAllocator, "queue");
        {
            let mut queue = Queue::new_in(&tracker);
            for i in 0..20 {
                queue.enqueue(format!("item-{i}")).unwrap();
            }
            queue.dequeue();
            assert_eq!(queue.len(), 19);
        }
        assert!(tracker.stats().is_balanced());
    }
}
