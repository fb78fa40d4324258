//! Deterministic random number generation for matches and agents.
//!
//! A match has a single base seed. Every team's agent receives its own seed
//! derived from it, so a replayed match hands identical seeds to identical
//! agents regardless of how many other agents consumed randomness.
//!
//! ```
//! use rust_arena::core::{GameRng, TeamId};
//!
//! let rng = GameRng::new(42);
//! assert_eq!(rng.team_seed(TeamId::new(1)), GameRng::new(42).team_seed(TeamId::new(1)));
//! assert_ne!(rng.team_seed(TeamId::new(0)), rng.team_seed(TeamId::new(1)));
//! ```

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::team::TeamId;

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed handed to the agent playing `team`.
    ///
    /// First word of the ChaCha8 stream selected by the team slot, keyed by
    /// the base seed. Depends only on those two values.
    #[must_use]
    pub fn team_seed(&self, team: TeamId) -> u64 {
        let mut stream = ChaCha8Rng::seed_from_u64(self.seed);
        // stream 0 is the match's own sequence
        stream.set_stream(u64::from(team.0) + 1);
        stream.next_u64()
    }

    /// Generate a random integer in the given range.
    pub fn gen_range(&mut self, range: std::ops::Range<i64>) -> i64 {
        self.inner.gen_range(range)
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range(0..1000), rng2.gen_range(0..1000));
        }
    }

    #[test]
    fn test_team_seed_independent_of_consumption() {
        let mut rng = GameRng::new(7);
        let before = rng.team_seed(TeamId::new(2));
        for _ in 0..50 {
            rng.gen_range(0..1000);
        }
        assert_eq!(rng.team_seed(TeamId::new(2)), before);
    }

    #[test]
    fn test_team_seed_is_chacha_stream() {
        let mut expected = ChaCha8Rng::seed_from_u64(7);
        expected.set_stream(4);
        assert_eq!(GameRng::new(7).team_seed(TeamId::new(3)), expected.next_u64());
    }

    #[test]
    fn test_team_seeds_differ() {
        let rng = GameRng::new(7);
        let seeds: Vec<_> = TeamId::all(4).map(|t| rng.team_seed(t)).collect();
        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }

    #[test]
    fn test_choose() {
        let mut rng = GameRng::new(42);
        let items = [1, 2, 3];
        assert!(items.contains(rng.choose(&items).unwrap()));

        let empty: [i32; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }
}
