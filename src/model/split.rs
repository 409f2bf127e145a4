//! Seeded train/test index split.
//!
//! Evaluation for both model stages shuffles row indices with a caller-supplied
//! seed and holds out a fixed fraction, so the same seed always produces the
//! same partition regardless of thread count.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Share of rows held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` deterministically and cut off the test block.
///
/// The test size rounds up, so any non-empty dataset gets at least one held-out
/// row. Callers that fit on the train block handle the tiny-`n` case where it
/// comes back empty or too small.
pub fn split_indices(n: usize, seed: u64) -> SplitIndices {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let n_test = ((n as f64) * TEST_FRACTION).ceil() as usize;
    SplitIndices {
        test: order[..n_test].to_vec(),
        train: order[n_test..].to_vec(),
    }
}

/// Materialize the rows behind an index list.
pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let a = split_indices(50, 42);
        let b = split_indices(50, 42);
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn different_seeds_give_different_shuffles() {
        let a = split_indices(100, 1);
        let b = split_indices(100, 2);
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn split_partitions_all_indices() {
        let s = split_indices(10, 7);
        assert_eq!(s.test.len(), 2);
        assert_eq!(s.train.len(), 8);

        let mut all: Vec<usize> = s.train.iter().chain(&s.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn tiny_datasets_still_hold_out_a_row() {
        let s = split_indices(2, 0);
        assert_eq!(s.test.len(), 1);
        assert_eq!(s.train.len(), 1);

        let empty = split_indices(0, 0);
        assert!(empty.train.is_empty());
        assert!(empty.test.is_empty());
    }

    #[test]
    fn select_follows_index_order() {
        let items = vec!["a", "b", "c", "d"];
        assert_eq!(select(&items, &[3, 1]), vec!["d", "b"]);
    }
}
