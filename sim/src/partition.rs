//! Work partitioning for the parallel phases.
//!
//! A work list of `n` items is split into contiguous, non-overlapping,
//! order-preserving ranges of `ceil(n / t)` items, one per worker task.
//! Partitioning depends only on `(n, t)`, so every item belongs to exactly
//! one batch and no two tasks ever touch the same index.

use std::ops::Range;

/// Number of items per batch for `n` items over `workers` workers.
#[inline]
pub fn batch_size(n: usize, workers: usize) -> usize {
    n.div_ceil(workers.max(1)).max(1)
}

/// Split `[0, n)` into contiguous batches for `workers` workers.
///
/// Returns no ranges when `n == 0`. A worker count of zero is treated as one.
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let size = batch_size(n, workers);
    (0..n)
        .step_by(size)
        .map(|start| start..(start + size).min(n))
        .collect()
}

/// Split `items` into disjoint mutable sub-slices matching `ranges`.
///
/// `ranges` must be contiguous from index 0, as produced by [`partition`].
pub fn split_disjoint_mut<'a, T>(mut items: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut slices = Vec::with_capacity(ranges.len());
    let mut consumed = 0;
    for range in ranges {
        debug_assert_eq!(range.start, consumed);
        let (head, tail) = items.split_at_mut(range.len());
        slices.push(head);
        items = tail;
        consumed = range.end;
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(partition(0, 4).is_empty());
        assert!(partition(0, 1).is_empty());
    }

    #[test]
    fn test_fewer_items_than_workers() {
        let ranges = partition(3, 8);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_uneven_split() {
        // ceil(10 / 3) = 4
        assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_split_disjoint_mut_matches_ranges() {
        let mut data: Vec<u32> = (0..10).collect();
        let ranges = partition(data.len(), 3);
        let slices = split_disjoint_mut(&mut data, &ranges);
        assert_eq!(slices.len(), 3);
        for slice in slices {
            for v in slice.iter_mut() {
                *v *= 10;
            }
        }
        assert_eq!(data, (0..10).map(|v| v * 10).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_partition_covers_each_index_once(n in 0usize..2000, t in 1usize..64) {
            let ranges = partition(n, t);
            let mut seen = vec![0u32; n];
            for range in &ranges {
                prop_assert!(!range.is_empty());
                for i in range.clone() {
                    seen[i] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&count| count == 1));
            prop_assert!(ranges.len() <= t);
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
        }

        #[test]
        fn prop_partition_is_deterministic(n in 0usize..500, t in 1usize..32) {
            prop_assert_eq!(partition(n, t), partition(n, t));
        }
    }
}
