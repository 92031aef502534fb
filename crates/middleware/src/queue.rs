use std::collections::VecDeque;
use std::fmt::Debug;

use parking_lot::Mutex;

/// A FIFO buffer holding at most `capacity` undelivered messages.
///
/// Overflow policy is drop-oldest: pushing into a full buffer evicts the
/// front element and hands it back to the caller. A capacity of zero means
/// unbounded.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Maximum number of buffered items, zero if unbounded.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an item, returning the evicted oldest item if the queue was full.
    pub fn push(&self, item: T) -> Option<T> {
        let mut items = self.items.lock();
        let evicted = if self.capacity > 0 && items.len() >= self.capacity {
            items.pop_front()
        } else {
            None
        };
        items.push_back(item);
        evicted
    }

    /// Removes the oldest item.
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drops every buffered item.
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(4);
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let queue = BoundedQueue::new(2);
        assert_eq!(queue.push(1), None);
        assert_eq!(queue.push(2), None);
        assert_eq!(queue.push(3), Some(1));
        assert_eq!(queue.push(4), Some(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(4));
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let queue = BoundedQueue::new(0);
        for i in 0..10_000 {
            assert_eq!(queue.push(i), None);
        }
        assert_eq!(queue.len(), 10_000);
        assert_eq!(queue.pop(), Some(0));
    }

    #[test]
    fn test_clear() {
        let queue = BoundedQueue::new(3);
        queue.push("a");
        queue.push("b");
        queue.clear();
        assert!(queue.is_empty());
    }
}
