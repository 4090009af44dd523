//! Partition completeness over arbitrary sizes.

use proptest::prelude::*;
use vqe_engine::{partition_range, subpartition};

proptest! {
    #[test]
    fn ranges_tile_the_list(total in 0usize..500, workers in 1usize..64) {
        let mut next = 0;
        for i in 0..workers {
            let range = partition_range(i, workers, total);
            prop_assert_eq!(range.start, next);
            prop_assert!(range.end >= range.start);
            next = range.end;
        }
        prop_assert_eq!(next, total);
    }

    #[test]
    fn sizes_differ_by_at_most_one(total in 0usize..500, workers in 1usize..64) {
        let sizes: Vec<usize> = (0..workers).map(|i| partition_range(i, workers, total).len()).collect();
        let min = sizes.iter().copied().min().unwrap_or(0);
        let max = sizes.iter().copied().max().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn two_level_split_covers_every_index(
        total in 0usize..300,
        ranks in 1usize..8,
        threads in 1usize..8,
    ) {
        let mut seen = vec![0u32; total];
        for rank in 0..ranks {
            let rank_range = partition_range(rank, ranks, total);
            for thread in 0..threads {
                for i in subpartition(&rank_range, thread, threads) {
                    seen[i] += 1;
                }
            }
        }
        prop_assert!(seen.iter().all(|&n| n == 1));
    }
}
