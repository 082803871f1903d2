//! # Batch Optimizer
//!
//! Decides how many units a character can craft in one go. Batch size follows
//! a logistic curve over effective skill, so novices make single units,
//! experts approach the cap, and the middle of the curve is where practice
//! pays off most.
//!
//! ```text
//! effective = (skill + 0.5 * proficiency) / difficulty_multiplier
//! batch     = max(1, floor(max / (1 + e^(-(effective - 5)))))
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Batch cap used when the caller gives none.
pub const DEFAULT_MAX_BATCH: u32 = 20;
/// The cap never exceeds this multiple of the recipe's base batch.
const BASE_BATCH_FACTOR: u32 = 4;
/// Steepness of the batch curve.
const GROWTH_RATE: f64 = 1.0;
/// Effective skill at which half the cap is reached.
const CENTER: f64 = 5.0;
/// Proficiency counts for half a skill level.
const PROFICIENCY_WEIGHT: f64 = 0.5;
/// Time saved per unit above the base batch.
const TIME_SAVED_PER_UNIT: f64 = 0.05;
/// Cap on time saved.
const MAX_TIME_SAVED: f64 = 0.5;
/// Per-level batch time discount.
const BATCH_TIME_SKILL_STEP: f64 = 0.03;
/// Cap on batch time discount.
const MAX_BATCH_TIME_DISCOUNT: f64 = 0.3;
/// Success penalty per extra unit.
const BATCH_SUCCESS_PENALTY: f64 = 0.02;
/// Cap on success penalty.
const MAX_BATCH_SUCCESS_PENALTY: f64 = 0.2;
/// Lowest batch success rate.
const MIN_BATCH_SUCCESS: f64 = 0.05;

/// Inputs to [`BatchOptimizer::calculate_optimal_batch`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchOptimizationParams {
    /// Recipe's own batch size, at least 1.
    pub base_batch_size: u32,
    /// Relevant skill level.
    pub skill_level: u32,
    /// Relevant proficiency level.
    pub proficiency_level: u32,
    /// Recipe difficulty scaling, positive.
    pub difficulty_multiplier: f64,
    /// Hard cap; [`DEFAULT_MAX_BATCH`] when `None`.
    pub max_batch_limit: Option<u32>,
}

impl Default for BatchOptimizationParams {
    fn default() -> Self {
        Self {
            base_batch_size: 1,
            skill_level: 0,
            proficiency_level: 0,
            difficulty_multiplier: 1.0,
            max_batch_limit: None,
        }
    }
}

/// Shape of the curve that produced a batch size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Curve maximum (`L`).
    pub max_value: f64,
    /// Steepness (`k`).
    pub growth_rate: f64,
    /// Midpoint (`x0`).
    pub center: f64,
    /// Input the curve was evaluated at.
    pub effective_skill: f64,
}

/// Output of [`BatchOptimizer::calculate_optimal_batch`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchOptimizationResult {
    /// Units per batch, at least 1.
    pub batch_size: u32,
    /// Share of the cap reached, in `[0, 1]`.
    pub efficiency: f64,
    /// Share of time saved, in `[0, 0.5]`.
    pub time_saved_percent: f64,
    /// Curve snapshot.
    pub logistic: LogisticParams,
}

/// Mastery band of a batch size relative to its cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BatchLevel {
    /// Below 20% of the cap.
    Novice,
    /// 20% or more.
    Basic,
    /// 40% or more.
    Proficient,
    /// 60% or more.
    Expert,
    /// 80% or more.
    Master,
}

impl BatchLevel {
    /// Display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Novice => "novice",
            Self::Basic => "basic",
            Self::Proficient => "proficient",
            Self::Expert => "expert",
            Self::Master => "master",
        }
    }
}

impl fmt::Display for BatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure batch sizing functions.
pub struct BatchOptimizer;

impl BatchOptimizer {
    /// `L / (1 + e^(-k(x - x0)))`.
    #[inline]
    #[must_use]
    pub fn logistic_function(x: f64, max_value: f64, growth_rate: f64, center: f64) -> f64 {
        max_value / (1.0 + (-growth_rate * (x - center)).exp())
    }

    /// Computes the batch size for the given skill situation.
    #[must_use]
    pub fn calculate_optimal_batch(params: &BatchOptimizationParams) -> BatchOptimizationResult {
        let base = params.base_batch_size.max(1);
        let effective_skill = (f64::from(params.skill_level)
            + f64::from(params.proficiency_level) * PROFICIENCY_WEIGHT)
            / params.difficulty_multiplier;

        let cap = params
            .max_batch_limit
            .unwrap_or(DEFAULT_MAX_BATCH)
            .min(base.saturating_mul(BASE_BATCH_FACTOR));
        let max_value = f64::from(cap);

        let raw = Self::logistic_function(effective_skill, max_value, GROWTH_RATE, CENTER);
        let batch_size = if raw.is_finite() && raw >= 1.0 {
            raw.floor() as u32
        } else {
            1
        };

        let efficiency = if max_value > 0.0 {
            (f64::from(batch_size) / max_value).min(1.0)
        } else {
            1.0
        };

        BatchOptimizationResult {
            batch_size,
            efficiency,
            time_saved_percent: Self::calculate_time_saved(batch_size, base),
            logistic: LogisticParams {
                max_value,
                growth_rate: GROWTH_RATE,
                center: CENTER,
                effective_skill,
            },
        }
    }

    /// 5% per unit above the base batch, at most 50%.
    #[must_use]
    pub fn calculate_time_saved(batch_size: u32, base_batch_size: u32) -> f64 {
        if batch_size <= base_batch_size {
            return 0.0;
        }
        (f64::from(batch_size - base_batch_size) * TIME_SAVED_PER_UNIT).min(MAX_TIME_SAVED)
    }

    /// Time for a whole batch; never less than a single unit.
    #[must_use]
    pub fn calculate_batch_time(single_time: f64, batch_size: u32, skill_level: u32) -> f64 {
        let discount = (f64::from(skill_level) * BATCH_TIME_SKILL_STEP).min(MAX_BATCH_TIME_DISCOUNT);
        (single_time * f64::from(batch_size) * (1.0 - discount)).max(single_time)
    }

    /// Success rate for a whole batch; each extra unit costs 2%, at most 20%.
    #[must_use]
    pub fn calculate_batch_success_rate(single_rate: f64, batch_size: u32) -> f64 {
        let penalty = (f64::from(batch_size.saturating_sub(1)) * BATCH_SUCCESS_PENALTY)
            .min(MAX_BATCH_SUCCESS_PENALTY);
        (single_rate - penalty).max(MIN_BATCH_SUCCESS)
    }

    /// Mastery band of `batch_size` out of `max_batch`.
    #[must_use]
    pub fn batch_level_description(batch_size: u32, max_batch: u32) -> BatchLevel {
        if max_batch == 0 {
            return BatchLevel::Novice;
        }
        let ratio = f64::from(batch_size) / f64::from(max_batch);
        if ratio >= 0.8 {
            BatchLevel::Master
        } else if ratio >= 0.6 {
            BatchLevel::Expert
        } else if ratio >= 0.4 {
            BatchLevel::Proficient
        } else if ratio >= 0.2 {
            BatchLevel::Basic
        } else {
            BatchLevel::Novice
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(skill: u32, difficulty: f64) -> BatchOptimizationParams {
        BatchOptimizationParams {
            base_batch_size: 5,
            skill_level: skill,
            difficulty_multiplier: difficulty,
            ..Default::default()
        }
    }

    #[test]
    fn test_logistic_center() {
        assert!((BatchOptimizer::logistic_function(5.0, 10.0, 1.0, 5.0) - 5.0).abs() < 1e-9);
        assert!(BatchOptimizer::logistic_function(50.0, 10.0, 1.0, 5.0) > 9.99);
        assert!(BatchOptimizer::logistic_function(-50.0, 10.0, 1.0, 5.0) < 0.01);
    }

    #[test]
    fn test_novice_gets_single_unit() {
        let result = BatchOptimizer::calculate_optimal_batch(&params(0, 1.0));
        assert_eq!(result.batch_size, 1);
        assert!((result.efficiency - 0.05).abs() < 1e-9);
        assert!(result.time_saved_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_master_approaches_cap() {
        let result = BatchOptimizer::calculate_optimal_batch(&params(15, 1.0));
        // cap = min(20, 5 * 4)
        assert_eq!(result.batch_size, 19);
        assert!((result.logistic.max_value - 20.0).abs() < f64::EPSILON);
        assert!((result.time_saved_percent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_limit_and_base_cap() {
        let mut p = params(30, 1.0);
        p.max_batch_limit = Some(6);
        assert_eq!(BatchOptimizer::calculate_optimal_batch(&p).batch_size, 5);

        p.base_batch_size = 1;
        p.max_batch_limit = None;
        let result = BatchOptimizer::calculate_optimal_batch(&p);
        assert_eq!(result.batch_size, 3);
        assert!((result.logistic.max_value - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_proficiency_counts_half() {
        let mut p = params(4, 1.0);
        p.proficiency_level = 2;
        let result = BatchOptimizer::calculate_optimal_batch(&p);
        assert!((result.logistic.effective_skill - 5.0).abs() < 1e-9);
        assert_eq!(result.batch_size, 10);
    }

    #[test]
    fn test_time_saved() {
        assert!(BatchOptimizer::calculate_time_saved(3, 5).abs() < f64::EPSILON);
        assert!((BatchOptimizer::calculate_time_saved(8, 5) - 0.15).abs() < 1e-9);
        assert!((BatchOptimizer::calculate_time_saved(40, 5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_batch_time_and_success() {
        assert!((BatchOptimizer::calculate_batch_time(10.0, 5, 5) - 42.5).abs() < 1e-9);
        assert!((BatchOptimizer::calculate_batch_time(10.0, 5, 50) - 35.0).abs() < 1e-9);
        assert!((BatchOptimizer::calculate_batch_time(10.0, 1, 50) - 10.0).abs() < 1e-9);

        assert!((BatchOptimizer::calculate_batch_success_rate(0.9, 1) - 0.9).abs() < 1e-9);
        assert!((BatchOptimizer::calculate_batch_success_rate(0.9, 6) - 0.8).abs() < 1e-9);
        assert!((BatchOptimizer::calculate_batch_success_rate(0.9, 30) - 0.7).abs() < 1e-9);
        assert!((BatchOptimizer::calculate_batch_success_rate(0.1, 30) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_level_bands() {
        assert_eq!(BatchOptimizer::batch_level_description(16, 20), BatchLevel::Master);
        assert_eq!(BatchOptimizer::batch_level_description(12, 20), BatchLevel::Expert);
        assert_eq!(BatchOptimizer::batch_level_description(8, 20), BatchLevel::Proficient);
        assert_eq!(BatchOptimizer::batch_level_description(4, 20), BatchLevel::Basic);
        assert_eq!(BatchOptimizer::batch_level_description(3, 20), BatchLevel::Novice);
        assert_eq!(BatchOptimizer::batch_level_description(3, 0), BatchLevel::Novice);
        assert_eq!(BatchLevel::Master.to_string(), "master");
    }
}
