//! Sliding Window Buffer - ordered, append-only sequence
//!
//! One generic container backs every buffer of the controller: observations,
//! predictions, adaptive thresholds and aggregate errors. Pruning is an
//! explicit operation; appending never drops anything.

use std::collections::VecDeque;

// ============================================================================
// BUFFER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindowBuffer<T> {
    items: VecDeque<T>,
}

impl<T> SlidingWindowBuffer<T> {
    pub fn new() -> Self {
        Self { items: VecDeque::new() }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self { items: items.into_iter().collect() }
    }

    /// Push an item at the recent end
    pub fn append(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Discard all but the `n` most recent items
    pub fn prune_to_length(&mut self, n: usize) {
        let excess = self.items.len().saturating_sub(n);
        if excess > 0 {
            self.items.drain(..excess);
        }
    }
}

impl<T: Clone> SlidingWindowBuffer<T> {
    /// Up to `n` most recent items, oldest first. Never pads.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let start = self.items.len().saturating_sub(n);
        self.items.range(start..).cloned().collect()
    }
}

impl<T> Default for SlidingWindowBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_operations() {
        let mut buffer = SlidingWindowBuffer::new();
        assert!(buffer.is_empty());

        for i in 0..10 {
            buffer.append(i);
        }

        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.tail(3), vec![7, 8, 9]);
        assert_eq!(buffer.last(), Some(&9));
    }

    #[test]
    fn test_tail_shorter_than_requested() {
        let buffer = SlidingWindowBuffer::from_items(vec![1.0, 2.0]);
        assert_eq!(buffer.tail(5), vec![1.0, 2.0]);
        assert!(SlidingWindowBuffer::<f64>::new().tail(3).is_empty());
    }

    #[test]
    fn test_prune_noop_when_short() {
        let mut buffer = SlidingWindowBuffer::from_items(vec![1, 2]);
        buffer.prune_to_length(5);
        assert_eq!(buffer.tail(10), vec![1, 2]);

        buffer.prune_to_length(0);
        assert!(buffer.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_prune_keeps_most_recent(items in proptest::collection::vec(any::<i32>(), 0..64), n in 0usize..80) {
            let mut buffer = SlidingWindowBuffer::from_items(items.clone());
            buffer.prune_to_length(n);

            let expected_len = items.len().min(n);
            prop_assert_eq!(buffer.len(), expected_len);

            let expected: Vec<i32> = items[items.len() - expected_len..].to_vec();
            prop_assert_eq!(buffer.tail(usize::MAX), expected);
        }

        #[test]
        fn prop_tail_is_suffix(items in proptest::collection::vec(any::<u16>(), 0..64), n in 0usize..80) {
            let buffer = SlidingWindowBuffer::from_items(items.clone());
            let tail = buffer.tail(n);

            prop_assert_eq!(tail.len(), items.len().min(n));
            prop_assert!(items.ends_with(&tail));
        }
    }
}
