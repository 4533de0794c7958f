//! The generator used to break ties between candidates that are ready at the same time.
//!
//! It is a plain linear congruential generator: deterministic, reproducible from its seed,
//! and good enough to spread choices evenly. It is not meant to be unpredictable.
//!
//! Units created with [`Unit::new`](crate::Unit::new) draw their starting state from a
//! per-thread sequence of the same generator, so two fresh units do not make the same
//! first choice, while a program creating its units in the same order still replays
//! the same choices.

use std::cell::Cell;

const MULTIPLIER: u32 = 1103515245;
const INCREMENT: u32 = 12345;

/// Start of the per-thread sequence that seeds [`Unit::new`](crate::Unit::new), and the
/// seed of [`TieBreak::default`].
pub const DEFAULT_SEED: u32 = 1;

thread_local! {
    static SEEDS: Cell<TieBreak> = const { Cell::new(TieBreak::new(DEFAULT_SEED)) };
}

/// Linear congruential generator picking among ready candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TieBreak {
    state: u32,
}

impl Default for TieBreak {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl TieBreak {
    /// A generator starting from `seed`. Equal seeds give equal sequences.
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// A generator for a new unit, seeded from the next state of this thread's sequence.
    pub fn fresh() -> Self {
        SEEDS.with(|seeds| {
            let mut seeds_state = seeds.get();
            seeds_state.advance();
            seeds.set(seeds_state);
            Self::new(seeds_state.state)
        })
    }

    fn advance(&mut self) {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
    }

    /// Advances the state and returns a number in `0..n`.
    ///
    /// # Panics
    ///
    /// If `n` is zero.
    pub fn below(&mut self, n: usize) -> usize {
        assert!(n > 0, "tie-break range must not be empty");
        self.advance();
        (self.state >> 16) as usize % n
    }
}
