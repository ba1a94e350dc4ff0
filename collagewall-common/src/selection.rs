use crate::error::SelectionError;
use crate::pool::ImagePool;
use crate::state::SelectionState;
use crate::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Random,
    Sequential,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Random => write!(f, "random"),
            SelectionMode::Sequential => write!(f, "sequential"),
        }
    }
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SelectionMode::Random),
            "sequential" => Ok(SelectionMode::Sequential),
            other => Err(format!("unknown selection mode: {}", other)),
        }
    }
}

/// Draws images from a pool, remembering what has been shown.
///
/// Random mode guarantees every pool image appears once before any
/// repeat: drawn paths accumulate in the state history, and once the
/// history covers the pool it is cleared and a fresh cycle starts.
/// Sequential mode walks the pool newest-first from a persisted cursor.
///
/// The RNG is injected so tests can seed it.
#[derive(Debug)]
pub struct Selector<R: Rng> {
    mode: SelectionMode,
    state: SelectionState,
    rng: R,
}

impl Selector<StdRng> {
    pub fn new(mode: SelectionMode, state: SelectionState) -> Self {
        Self::with_rng(mode, state, StdRng::from_entropy())
    }
}

impl<R: Rng> Selector<R> {
    pub fn with_rng(mode: SelectionMode, state: SelectionState, rng: R) -> Self {
        Self { mode, state, rng }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn into_state(self) -> SelectionState {
        self.state
    }

    /// Draws the next image and updates the in-memory state. Persisting
    /// the state is the caller's job.
    pub fn next(&mut self, pool: &ImagePool) -> Result<PathBuf> {
        if pool.is_empty() {
            return Err(SelectionError::EmptyPool.into());
        }

        let chosen = match self.mode {
            SelectionMode::Random => self.next_random(pool)?,
            SelectionMode::Sequential => self.next_sequential(pool),
        };

        self.state.touch();
        Ok(chosen)
    }

    /// Draws `n` images in one batch.
    pub fn draw(&mut self, pool: &ImagePool, n: usize) -> Result<Vec<PathBuf>> {
        (0..n).map(|_| self.next(pool)).collect()
    }

    fn next_random(&mut self, pool: &ImagePool) -> Result<PathBuf> {
        // Files can come and go between applies; forget history entries
        // that no longer exist in the pool.
        let before = self.state.history.len();
        self.state.history.retain(|shown| pool.contains(shown));
        if self.state.history.len() < before {
            log::debug!(
                "Pruned {} stale history entries",
                before - self.state.history.len()
            );
        }

        // Pool exhausted: clear and start a new cycle.
        if self.state.history.len() >= pool.len() {
            log::debug!("Pool of {} images exhausted, starting new cycle", pool.len());
            self.state.history.clear();
        }

        let unseen: Vec<&PathBuf> = pool
            .paths()
            .filter(|p| {
                let p = p.to_string_lossy();
                !self.state.history.iter().any(|shown| *shown == p)
            })
            .collect();

        let chosen = unseen
            .choose(&mut self.rng)
            .ok_or(SelectionError::EmptyPool)?;
        let chosen = (*chosen).clone();

        self.state.history.push(chosen.to_string_lossy().to_string());
        Ok(chosen)
    }

    fn next_sequential(&mut self, pool: &ImagePool) -> PathBuf {
        let sorted = pool.sorted_recent_first();

        let next_index = match &self.state.cursor {
            Some(cursor) => sorted
                .iter()
                .position(|p| p.to_string_lossy() == *cursor)
                .map(|pos| (pos + 1) % sorted.len())
                .unwrap_or(0),
            None => 0,
        };

        let chosen = sorted[next_index].clone();
        self.state.cursor = Some(chosen.to_string_lossy().to_string());
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolEntry;
    use std::collections::HashSet;
    use std::time::{Duration, SystemTime};

    fn pool_of(names: &[&str]) -> ImagePool {
        // Later entries are older, so sequential order matches slice order
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, name)| PoolEntry {
                path: PathBuf::from(format!("/wallpapers/{}", name)),
                modified: SystemTime::UNIX_EPOCH
                    + Duration::from_secs(1_000_000 - i as u64 * 60),
            })
            .collect();
        ImagePool::from_entries(entries)
    }

    fn seeded(mode: SelectionMode) -> Selector<StdRng> {
        Selector::with_rng(mode, SelectionState::new(), StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_random_first_cycle_is_a_permutation() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut selector = seeded(SelectionMode::Random);

        let draws: Vec<PathBuf> = (0..3).map(|_| selector.next(&pool).unwrap()).collect();

        let unique: HashSet<&PathBuf> = draws.iter().collect();
        assert_eq!(unique.len(), 3, "three draws must be a permutation of the pool");
    }

    #[test]
    fn test_random_fourth_draw_resets_history() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut selector = seeded(SelectionMode::Random);

        for _ in 0..3 {
            selector.next(&pool).unwrap();
        }
        assert_eq!(selector.state().history.len(), 3);

        let fourth = selector.next(&pool).unwrap();
        assert_eq!(
            selector.state().history,
            vec![fourth.to_string_lossy().to_string()]
        );
    }

    #[test]
    fn test_random_full_coverage_every_cycle() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);
        let n = pool.len();
        let mut selector = seeded(SelectionMode::Random);

        // 3xN draws: every N-draw cycle covers the whole pool with no
        // repeats inside the cycle
        let draws: Vec<PathBuf> = (0..3 * n).map(|_| selector.next(&pool).unwrap()).collect();

        for cycle in draws.chunks(n) {
            let unique: HashSet<&PathBuf> = cycle.iter().collect();
            assert_eq!(unique.len(), n, "cycle {:?} repeats an image", cycle);
        }
    }

    #[test]
    fn test_random_prunes_removed_files_from_history() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut selector = seeded(SelectionMode::Random);
        selector
            .state
            .history
            .push("/wallpapers/deleted.jpg".to_string());

        selector.next(&pool).unwrap();

        assert!(!selector
            .state()
            .history
            .contains(&"/wallpapers/deleted.jpg".to_string()));
    }

    #[test]
    fn test_random_empty_pool_fails() {
        let pool = ImagePool::from_entries(vec![]);
        let mut selector = seeded(SelectionMode::Random);

        assert!(selector.next(&pool).is_err());
    }

    #[test]
    fn test_sequential_visits_all_in_order_then_wraps() {
        let pool = pool_of(&["newest.jpg", "middle.jpg", "oldest.jpg"]);
        let mut selector = seeded(SelectionMode::Sequential);

        let names: Vec<String> = (0..4)
            .map(|_| {
                selector
                    .next(&pool)
                    .unwrap()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();

        assert_eq!(names, vec!["newest.jpg", "middle.jpg", "oldest.jpg", "newest.jpg"]);
    }

    #[test]
    fn test_sequential_resumes_from_persisted_cursor() {
        let pool = pool_of(&["newest.jpg", "middle.jpg", "oldest.jpg"]);

        let mut state = SelectionState::new();
        state.cursor = Some("/wallpapers/newest.jpg".to_string());
        let mut selector = Selector::with_rng(
            SelectionMode::Sequential,
            state,
            StdRng::seed_from_u64(0),
        );

        let next = selector.next(&pool).unwrap();
        assert_eq!(next.file_name().unwrap(), "middle.jpg");
    }

    #[test]
    fn test_sequential_missing_cursor_restarts_at_front() {
        let pool = pool_of(&["newest.jpg", "middle.jpg"]);

        let mut state = SelectionState::new();
        state.cursor = Some("/wallpapers/deleted.jpg".to_string());
        let mut selector = Selector::with_rng(
            SelectionMode::Sequential,
            state,
            StdRng::seed_from_u64(0),
        );

        let next = selector.next(&pool).unwrap();
        assert_eq!(next.file_name().unwrap(), "newest.jpg");
    }

    #[test]
    fn test_draw_batch_size() {
        let pool = pool_of(&["a.jpg", "b.jpg", "c.jpg"]);
        let mut selector = seeded(SelectionMode::Random);

        let draws = selector.draw(&pool, 2).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(selector.state().history.len(), 2);
    }
}
