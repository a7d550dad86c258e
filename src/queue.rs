//! Min-priority queue over float scores
//!
//! Three stages need a binary heap keyed by an `f64` score with an index
//! payload: lake flooding, territory growth, and trade-route A*. The std
//! `BinaryHeap` is a max-heap over `Ord`, so this wraps score + payload in
//! an entry with a reversed total order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry: an `f64` score and a payload, ordered so the *smallest*
/// score surfaces first in a `BinaryHeap`
#[derive(Debug, Clone, Copy)]
pub struct MinScored<T>(pub f64, pub T);

impl<T> PartialEq for MinScored<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl<T> Eq for MinScored<T> {}

impl<T> PartialOrd for MinScored<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for MinScored<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the min score on top
        other.0.total_cmp(&self.0)
    }
}

/// Min-heap over `(score, payload)` entries
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    heap: BinaryHeap<MinScored<T>>,
}

impl<T> MinHeap<T> {
    /// Create an empty heap
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Push a scored payload
    pub fn push(&mut self, score: f64, payload: T) {
        self.heap.push(MinScored(score, payload));
    }

    /// Pop the payload with the smallest score
    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|MinScored(score, payload)| (score, payload))
    }

    /// Peek at the smallest score without removing it
    pub fn peek_score(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.0)
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}
