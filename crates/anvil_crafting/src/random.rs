//! # Randomness Sources
//!
//! The success roll and random result quantities are the only
//! non-deterministic parts of a craft. Both are drawn from a `RandomSource`
//! handed in by the caller, so a save game can replay a session from its seed
//! and tests can script exact outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    /// Returns the next uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Returns a uniform integer in `[low, high]`.
    ///
    /// Returns `low` when the range is empty.
    fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        let span = f64::from(high - low + 1);
        let offset = (self.next_f64() * span).floor() as u32;
        low + offset.min(high - low)
    }

    /// Bernoulli trial with success probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

impl RandomSource for ChaCha8Rng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Creates the engine's default seeded generator.
#[must_use]
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A scripted sequence of values, replayed in order and cycled when exhausted.
///
/// Used for replays and tests where the exact outcome of every roll matters.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Creates a scripted source. Values are clamped into `[0, 1)`.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// A source that always returns the same value.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// A source whose rolls always pass any non-zero chance.
    #[must_use]
    pub fn always_succeed() -> Self {
        Self::constant(0.0)
    }

    /// A source whose rolls always fail any chance below one.
    #[must_use]
    pub fn always_fail() -> Self {
        Self::constant(1.0)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
