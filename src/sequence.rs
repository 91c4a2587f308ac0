//! Visit order over catalog indices: a permutation plus a cursor.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::DisplayOrderMode;

/// Permutation of catalog indices with a cursor governing the visit sequence.
///
/// Random mode reshuffles on forward wraparound only; a backward wrap keeps
/// the permutation as-is, and the reshuffled head may repeat the previous
/// cycle's tail.
#[derive(Debug)]
pub struct DisplayOrder {
    permutation: Vec<usize>,
    cursor: usize,
    mode: DisplayOrderMode,
    rng: StdRng,
}

impl DisplayOrder {
    pub fn new(catalog_size: usize, mode: DisplayOrderMode) -> Self {
        Self::with_rng(catalog_size, mode, StdRng::from_os_rng())
    }

    /// Deterministic variant for tests and reproducible runs.
    pub fn with_seed(catalog_size: usize, mode: DisplayOrderMode, seed: u64) -> Self {
        Self::with_rng(catalog_size, mode, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalog_size: usize, mode: DisplayOrderMode, mut rng: StdRng) -> Self {
        let mut permutation: Vec<usize> = (0..catalog_size).collect();
        if mode == DisplayOrderMode::Random {
            permutation.shuffle(&mut rng);
        }
        Self {
            permutation,
            cursor: 0,
            mode,
            rng,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Cursor position within the permutation (not a catalog index).
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Catalog index under the cursor.
    pub fn current(&self) -> Option<usize> {
        self.permutation.get(self.cursor).copied()
    }

    /// Advance the cursor, reshuffling on wraparound in Random mode.
    pub fn next(&mut self) -> Option<usize> {
        if self.permutation.is_empty() {
            return None;
        }
        self.cursor += 1;
        if self.cursor >= self.permutation.len() {
            if self.mode == DisplayOrderMode::Random {
                self.permutation.shuffle(&mut self.rng);
            }
            self.cursor = 0;
        }
        self.current()
    }

    /// Step the cursor back, wrapping to the end without reshuffling.
    pub fn previous(&mut self) -> Option<usize> {
        if self.permutation.is_empty() {
            return None;
        }
        if self.cursor == 0 {
            self.cursor = self.permutation.len() - 1;
        } else {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Drop catalog index `index` from the permutation, keeping the remaining
    /// values in lockstep with a catalog that removed the same element.
    pub fn remove_catalog_index(&mut self, index: usize) {
        if let Some(pos) = self.permutation.iter().position(|&v| v == index) {
            self.permutation.remove(pos);
        }
        for value in &mut self.permutation {
            if *value > index {
                *value -= 1;
            }
        }
        if self.cursor >= self.permutation.len() {
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_visits_each_index_once_per_cycle() {
        let mut order = DisplayOrder::with_seed(7, DisplayOrderMode::Random, 42);
        let mut seen = vec![order.current().unwrap()];
        for _ in 1..7 {
            seen.push(order.next().unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn previous_after_next_returns_to_prior_index() {
        let mut order = DisplayOrder::with_seed(5, DisplayOrderMode::Random, 1);
        let before = order.current().unwrap();
        order.next();
        assert_eq!(order.previous(), Some(before));
    }

    #[test]
    fn forward_wrap_reshuffles_into_a_fresh_permutation() {
        let mut order = DisplayOrder::with_seed(6, DisplayOrderMode::Random, 9);
        for _ in 0..5 {
            order.next();
        }
        // The wrapping call resets the cursor and yields another full cycle.
        let mut seen = vec![order.next().unwrap()];
        assert_eq!(order.position(), 0);
        for _ in 1..6 {
            seen.push(order.next().unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn backward_wrap_keeps_the_permutation() {
        let mut order = DisplayOrder::with_seed(5, DisplayOrderMode::Random, 3);
        let mut forward = vec![order.current().unwrap()];
        for _ in 1..5 {
            forward.push(order.next().unwrap());
        }
        // Rewind to the start, then wrap backward onto the tail.
        for _ in 1..5 {
            order.previous();
        }
        assert_eq!(order.position(), 0);
        assert_eq!(order.previous(), Some(forward[4]));
        assert_eq!(order.position(), 4);
    }

    #[test]
    fn date_mode_never_reshuffles() {
        let mut order = DisplayOrder::with_seed(4, DisplayOrderMode::DateAscending, 7);
        let first_cycle: Vec<_> = (0..4).map(|_| order.next().unwrap()).collect();
        let second_cycle: Vec<_> = (0..4).map(|_| order.next().unwrap()).collect();
        assert_eq!(first_cycle, vec![1, 2, 3, 0]);
        assert_eq!(first_cycle, second_cycle);
    }

    #[test]
    fn remove_under_cursor_keeps_cursor_valid() {
        let mut order = DisplayOrder::with_seed(3, DisplayOrderMode::DateAscending, 0);
        order.next();
        assert_eq!(order.current(), Some(1));
        order.remove_catalog_index(1);
        assert_eq!(order.len(), 2);
        // Former index 2 shifted down into the vacated slot.
        assert_eq!(order.current(), Some(1));
    }

    #[test]
    fn remove_tail_wraps_cursor_to_start() {
        let mut order = DisplayOrder::with_seed(3, DisplayOrderMode::DateAscending, 0);
        order.next();
        order.next();
        assert_eq!(order.current(), Some(2));
        order.remove_catalog_index(2);
        assert_eq!(order.position(), 0);
        assert_eq!(order.current(), Some(0));
    }

    #[test]
    fn remove_last_entry_exhausts() {
        let mut order = DisplayOrder::with_seed(1, DisplayOrderMode::Random, 0);
        order.remove_catalog_index(0);
        assert!(order.is_empty());
        assert_eq!(order.current(), None);
        assert_eq!(order.next(), None);
        assert_eq!(order.previous(), None);
    }

    #[test]
    fn single_entry_next_and_previous_stay_put() {
        let mut order = DisplayOrder::with_seed(1, DisplayOrderMode::Random, 0);
        assert_eq!(order.next(), Some(0));
        assert_eq!(order.previous(), Some(0));
        assert_eq!(order.position(), 0);
    }
}
