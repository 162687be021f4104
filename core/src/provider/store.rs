use std::collections::VecDeque;

/// Bookkeeping for which contiguous frame ranges are currently cached.
///
/// Ranges are half-open `[start, end)` intervals of frame numbers, kept in
/// arrival order (oldest first). The store enforces a capacity bound measured
/// in number of ranges, with the "insert, then evict" policy: a newly
/// recorded range may temporarily push the count one past the bound until
/// [`evict_if_needed`] is called.
///
/// This is pure bookkeeping. Deleting the cached frames of an evicted range
/// is the caller's job.
///
/// [`evict_if_needed`]: ChunkStore::evict_if_needed
pub struct ChunkStore {
    ranges: VecDeque<(usize, usize)>,
    capacity: usize,
}

impl ChunkStore {
    /// Create a store that retains up to `capacity` ranges.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert_ne!(capacity, 0);

        Self {
            ranges: VecDeque::new(),
            capacity,
        }
    }

    /// Record `[start, end)` as the newest tracked range.
    ///
    /// The range must not overlap a range that is already tracked. This is
    /// the caller's contract and is not validated here.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty or reversed (`start >= end`).
    pub fn record_range(&mut self, start: usize, end: usize) {
        assert!(start < end, "range [{}, {}) is empty or reversed", start, end);

        self.ranges.push_back((start, end));
    }

    /// Remove and return the oldest range if the store is over capacity.
    ///
    /// At most one range is removed per call, so this must be called once
    /// after every [`record_range`].
    ///
    /// [`record_range`]: ChunkStore::record_range
    pub fn evict_if_needed(&mut self) -> Option<(usize, usize)> {
        if self.ranges.len() > self.capacity {
            self.ranges.pop_front()
        } else {
            None
        }
    }

    /// Whether any tracked range covers `frame`.
    ///
    /// This is a linear scan, which is fine because the capacity is a
    /// single-digit count in practice.
    pub fn contains(&self, frame: usize) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| frame >= start && frame < end)
    }

    /// All tracked ranges, ascending by start frame.
    ///
    /// Call again for a fresh pass.
    pub fn ranges(&self) -> impl Iterator<Item = (usize, usize)> {
        let mut sorted: Vec<(usize, usize)> = self.ranges.iter().copied().collect();
        sorted.sort_unstable_by_key(|&(start, _)| start);

        sorted.into_iter()
    }

    /// The number of currently tracked ranges.
    pub fn num_ranges(&self) -> usize {
        self.ranges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_is_fifo() {
        let mut store = ChunkStore::new(2);

        store.record_range(10, 20);
        assert_eq!(store.evict_if_needed(), None);
        store.record_range(0, 10);
        assert_eq!(store.evict_if_needed(), None);

        store.record_range(20, 30);
        // Oldest by arrival, not smallest by start.
        assert_eq!(store.evict_if_needed(), Some((10, 20)));
        assert_eq!(store.num_ranges(), 2);
    }

    #[test]
    fn contains_covers_half_open_ranges() {
        let mut store = ChunkStore::new(2);
        store.record_range(5, 8);

        assert!(!store.contains(4));
        assert!(store.contains(5));
        assert!(store.contains(7));
        assert!(!store.contains(8));
    }

    #[test]
    fn ranges_are_sorted_and_restartable() {
        let mut store = ChunkStore::new(3);
        store.record_range(20, 30);
        store.record_range(0, 10);
        store.record_range(10, 20);

        let sorted: Vec<_> = store.ranges().collect();
        assert_eq!(sorted, vec![(0, 10), (10, 20), (20, 30)]);

        // A second pass yields the same sequence.
        let again: Vec<_> = store.ranges().collect();
        assert_eq!(again, sorted);
    }

    #[test]
    #[should_panic]
    fn empty_range_is_rejected() {
        let mut store = ChunkStore::new(1);
        store.record_range(3, 3);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_is_rejected() {
        let _ = ChunkStore::new(0);
    }
}
