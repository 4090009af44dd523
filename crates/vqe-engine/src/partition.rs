//! Static work partitioning.
//!
//! Worker `i` of `n` owns the contiguous range `[⌊i·K/n⌋, ⌊(i+1)·K/n⌋)` of a
//! `K`-element list. The ranges of all workers tile `[0, K)` exactly, and
//! their sizes differ by at most one.

use std::ops::Range;

/// Index range owned by worker `index` out of `workers` over `total` items.
///
/// `workers` of zero is treated as one.
pub fn partition_range(index: usize, workers: usize, total: usize) -> Range<usize> {
    let workers = workers.max(1) as u128;
    let total_wide = total as u128;
    let bound = |i: u128| -> usize {
        // i ≤ workers, so the quotient never exceeds `total`.
        usize::try_from(i.min(workers) * total_wide / workers).unwrap_or(total)
    };
    let index = index as u128;
    bound(index)..bound(index + 1)
}

/// Sub-range of `range` owned by worker `index` out of `workers`.
pub fn subpartition(range: &Range<usize>, index: usize, workers: usize) -> Range<usize> {
    let local = partition_range(index, workers, range.len());
    range.start + local.start..range.start + local.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(partition_range(0, 2, 10), 0..5);
        assert_eq!(partition_range(1, 2, 10), 5..10);
    }

    #[test]
    fn test_uneven_split() {
        let ranges: Vec<_> = (0..3).map(|i| partition_range(i, 3, 7)).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..7]);
    }

    #[test]
    fn test_more_workers_than_items() {
        let ranges: Vec<_> = (0..4).map(|i| partition_range(i, 4, 2)).collect();
        let sizes: Vec<_> = ranges.iter().map(ExactSizeIterator::len).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 2);
        assert!(sizes.iter().all(|&s| s <= 1));
    }

    #[test]
    fn test_empty_list() {
        assert!(partition_range(0, 3, 0).is_empty());
        assert!(partition_range(2, 3, 0).is_empty());
    }

    #[test]
    fn test_subpartition_offsets() {
        let rank = partition_range(1, 2, 9);
        assert_eq!(rank, 4..9);
        assert_eq!(subpartition(&rank, 0, 2), 4..6);
        assert_eq!(subpartition(&rank, 1, 2), 6..9);
    }
}
