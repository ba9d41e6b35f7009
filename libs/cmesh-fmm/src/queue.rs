//! Min priority queue keyed by `f64`.
//!
//! Entries with equal priority come out in insertion order. Built on
//! [`BinaryHeap`] with a reversed ordering.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{MarchError, MarchResult};

struct Entry<T> {
    priority: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the smallest priority, then the
        // earliest insertion.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min priority queue of items with `f64` priorities.
///
/// # Example
///
/// ```rust
/// use cmesh_fmm::PriorityQueue;
///
/// let mut q = PriorityQueue::new();
/// q.insert(2.0, 'b').unwrap();
/// q.insert(1.0, 'a').unwrap();
/// q.insert(2.0, 'c').unwrap();
/// assert_eq!(q.pop_min(), Some((1.0, 'a')));
/// assert_eq!(q.pop_min(), Some((2.0, 'b')));
/// assert_eq!(q.pop_min(), Some((2.0, 'c')));
/// assert_eq!(q.pop_min(), None);
/// ```
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            seq: 0,
        }
    }

    /// Adds `item` with the given priority.
    pub fn insert(&mut self, priority: f64, item: T) -> MarchResult<()> {
        self.heap
            .try_reserve(1)
            .map_err(|_| MarchError::Allocation {
                what: "priority queue",
            })?;
        self.heap.push(Entry {
            priority,
            seq: self.seq,
            item,
        });
        self.seq += 1;
        Ok(())
    }

    /// Removes the entry with the lowest priority.
    pub fn pop_min(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|e| (e.priority, e.item))
    }

    /// Lowest priority currently queued.
    pub fn peek_priority(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.priority)
    }

    /// Empties the queue, keeping its allocation.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.heap.len())
            .field("min", &self.peek_priority())
            .finish()
    }
}
