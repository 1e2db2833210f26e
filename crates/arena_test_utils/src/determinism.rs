//! Determinism testing utilities.
//!
//! The arena makes no cross-run promise in production (the RNG is seeded
//! from entropy), but with an injected seed a scene must replay exactly.
//! These helpers verify that.

use arena_core::scene::Scene;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Assert that the scene replayed identically.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Scene is non-deterministic!\n\
             Runs: {}\n\
             Ticks: {}\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.ticks,
            self.hashes
        );
    }
}

/// Build a scene `runs` times, tick each `ticks` times, and compare hashes.
pub fn verify_scene_determinism<F>(runs: usize, ticks: u64, setup: F) -> DeterminismResult
where
    F: Fn() -> Scene,
{
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut scene = setup();
        for _ in 0..ticks {
            scene.tick();
        }
        hashes.push(scene.state_hash());
    }
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Compare two runs tick-by-tick, returning the first tick where they differ.
pub fn find_first_divergence<F>(setup: F, ticks: u64) -> Option<u64>
where
    F: Fn() -> Scene,
{
    let mut a = setup();
    let mut b = setup();
    for tick in 0..ticks {
        a.tick();
        b.tick();
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }
    None
}

/// Proptest strategies for arena scenarios.
pub mod strategies {
    use proptest::prelude::*;

    /// Seeds.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Roster sizes worth fighting over (2-20).
    pub fn arb_roster_size() -> impl Strategy<Value = usize> {
        2usize..=20
    }

    /// Hit strengths, including absurd ones that would fling agents off-screen.
    pub fn arb_damage() -> impl Strategy<Value = f32> {
        0.0f32..500.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::brawl;
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_replays() {
        verify_scene_determinism(3, 600, || brawl(5, 10)).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| brawl(9, 6), 400), None);
    }

    #[test]
    fn test_different_seeds_usually_differ() {
        let a = verify_scene_determinism(1, 100, || brawl(1, 6));
        let b = verify_scene_determinism(1, 100, || brawl(2, 6));
        assert_ne!(a.hashes, b.hashes);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_any_seed_replays(seed in strategies::arb_seed()) {
            let result = verify_scene_determinism(2, 200, move || brawl(seed, 5));
            prop_assert!(result.is_deterministic);
        }
    }
}
