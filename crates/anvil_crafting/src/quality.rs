//! # Tool Qualities
//!
//! A quality is a named capability a tool provides at some level (a knife
//! provides `CUT` 2, a hacksaw provides `SAW_M` 1). Recipes state the
//! qualities they need, and the manager here decides whether a tool's quality
//! set satisfies them and which of several candidate sets fits best.
//!
//! Levels range from 0 to [`MAX_QUALITY_LEVEL`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{AnvilError, AnvilResult};
use crate::ids::{ItemId, QualityId};

/// Highest quality level a tool can have.
pub const MAX_QUALITY_LEVEL: u8 = 5;

/// Time saved per level of surplus quality.
const TIME_STEP_PER_LEVEL: f64 = 0.1;
/// Surplus quality never cuts time below this share of the base.
const MIN_TIME_FACTOR: f64 = 0.2;
/// Success rate gained per level of surplus quality.
const SUCCESS_STEP_PER_LEVEL: f64 = 0.05;
/// Lowest success rate quality adjustments can produce.
const MIN_SUCCESS_RATE: f64 = 0.05;
/// Score contribution of each matched level when ranking candidates.
const LEVEL_SCORE_WEIGHT: f64 = 0.1;

/// Definition of a quality, loaded from content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDefinition {
    /// Unique quality identifier.
    pub id: QualityId,
    /// Tools that provide this quality.
    #[serde(default)]
    pub related_tools: HashSet<ItemId>,
    /// Item types that provide this quality.
    #[serde(default)]
    pub related_item_types: HashSet<String>,
    /// Level assumed when a related tool does not state its own.
    #[serde(default)]
    pub default_level: u8,
}

/// One quality rating of one tool instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityData {
    /// The quality.
    pub quality_id: QualityId,
    /// The level, `0..=5`.
    pub level: u8,
}

impl QualityData {
    /// Creates a rating, clamping the level to [`MAX_QUALITY_LEVEL`].
    #[must_use]
    pub fn new(quality_id: impl Into<QualityId>, level: u8) -> Self {
        Self {
            quality_id: quality_id.into(),
            level: level.min(MAX_QUALITY_LEVEL),
        }
    }
}

/// A quality a recipe asks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRequirement {
    /// The quality.
    pub quality_id: QualityId,
    /// Minimum acceptable level.
    pub min_level: u8,
    /// Whether the recipe fails outright without it.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl QualityRequirement {
    /// A mandatory requirement.
    #[must_use]
    pub fn required(quality_id: impl Into<QualityId>, min_level: u8) -> Self {
        Self {
            quality_id: quality_id.into(),
            min_level,
            required: true,
        }
    }

    /// An optional requirement: ignored when absent, level-checked when present.
    #[must_use]
    pub fn optional(quality_id: impl Into<QualityId>, min_level: u8) -> Self {
        Self {
            quality_id: quality_id.into(),
            min_level,
            required: false,
        }
    }
}

/// A quality present below the requested level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsufficientQuality {
    /// The quality.
    pub quality_id: QualityId,
    /// Level asked for.
    pub required: u8,
    /// Level available.
    pub has: u8,
}

/// Outcome of matching a quality set against requirements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QualityCheckResult {
    /// True when nothing required is missing and nothing present is too low.
    pub matches: bool,
    /// Required qualities that are absent.
    pub missing_required: Vec<QualityId>,
    /// Qualities present at too low a level.
    pub insufficient_level: Vec<InsufficientQuality>,
    /// Requirements satisfied, with the level that satisfied them.
    pub matched: Vec<QualityData>,
}

#[derive(Deserialize)]
struct QualityFile {
    #[serde(default)]
    qualities: Vec<QualityDefinition>,
}

/// Registry of quality definitions plus the matching rules.
#[derive(Clone, Debug, Default)]
pub struct QualityManager {
    definitions: HashMap<QualityId, QualityDefinition>,
}

impl QualityManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads definitions from a TOML document with `[[qualities]]` tables.
    ///
    /// # Errors
    ///
    /// Returns error on malformed TOML or a default level above 5.
    pub fn from_toml_str(content: &str) -> AnvilResult<Self> {
        let file: QualityFile = toml::from_str(content)?;
        let mut manager = Self::new();
        for definition in file.qualities {
            manager.register(definition)?;
        }
        Ok(manager)
    }

    /// Registers a definition, replacing any previous one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the default level exceeds [`MAX_QUALITY_LEVEL`].
    pub fn register(&mut self, definition: QualityDefinition) -> AnvilResult<()> {
        if definition.default_level > MAX_QUALITY_LEVEL {
            return Err(AnvilError::InvalidConfig(format!(
                "quality {} default level {} exceeds {MAX_QUALITY_LEVEL}",
                definition.id, definition.default_level
            )));
        }
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Looks up a definition.
    #[must_use]
    pub fn definition(&self, id: &QualityId) -> Option<&QualityDefinition> {
        self.definitions.get(id)
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// True if no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Default quality set of a tool, derived from the definitions that list it.
    ///
    /// Sorted by quality id so the result is stable.
    #[must_use]
    pub fn qualities_for_tool(&self, tool: &ItemId) -> Vec<QualityData> {
        let mut qualities: Vec<QualityData> = self
            .definitions
            .values()
            .filter(|d| d.related_tools.contains(tool))
            .map(|d| QualityData::new(d.id.clone(), d.default_level))
            .collect();
        qualities.sort_by(|a, b| a.quality_id.cmp(&b.quality_id));
        qualities
    }

    /// Classifies every requirement against an available quality set.
    ///
    /// If the same quality appears more than once in `available`, the last
    /// entry wins.
    #[must_use]
    pub fn check_quality_requirements(
        available: &[QualityData],
        requirements: &[QualityRequirement],
    ) -> QualityCheckResult {
        let lookup: HashMap<&QualityId, u8> = available
            .iter()
            .map(|q| (&q.quality_id, q.level))
            .collect();

        let mut result = QualityCheckResult::default();

        for requirement in requirements {
            match lookup.get(&requirement.quality_id) {
                None if requirement.required => {
                    result.missing_required.push(requirement.quality_id.clone());
                }
                None => {}
                Some(&level) if level < requirement.min_level => {
                    result.insufficient_level.push(InsufficientQuality {
                        quality_id: requirement.quality_id.clone(),
                        required: requirement.min_level,
                        has: level,
                    });
                }
                Some(&level) => {
                    result
                        .matched
                        .push(QualityData::new(requirement.quality_id.clone(), level));
                }
            }
        }

        result.matches = result.missing_required.is_empty() && result.insufficient_level.is_empty();
        result
    }

    /// Picks the candidate quality set that best satisfies the requirements.
    ///
    /// Candidates that do not fully match are skipped. The score is the number
    /// of matched requirements plus a tenth of each matched level. Ties go to
    /// the earliest candidate. Returns `None` if no candidate matches.
    #[must_use]
    pub fn find_best_quality_match(
        candidates: &[Vec<QualityData>],
        requirements: &[QualityRequirement],
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let check = Self::check_quality_requirements(candidate, requirements);
            if !check.matches {
                continue;
            }

            let score = check.matched.len() as f64
                + check
                    .matched
                    .iter()
                    .map(|q| LEVEL_SCORE_WEIGHT * f64::from(q.level))
                    .sum::<f64>();

            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }

        best.map(|(index, _)| index)
    }

    /// Surplus (positive) or deficit (negative) of an actual level.
    #[inline]
    #[must_use]
    pub fn quality_level_difference(required: u8, actual: u8) -> i32 {
        i32::from(actual) - i32::from(required)
    }

    /// Each surplus level saves 10% of the base time, never below 20% of it.
    #[must_use]
    pub fn adjust_time_by_quality(difference: i32, base_time: f64) -> f64 {
        let scaled = base_time * (1.0 - f64::from(difference) * TIME_STEP_PER_LEVEL);
        scaled.max(base_time * MIN_TIME_FACTOR)
    }

    /// Each surplus level adds 5% success, clamped to `[0.05, 1.0]`.
    #[must_use]
    pub fn adjust_success_rate_by_quality(difference: i32, base_rate: f64) -> f64 {
        (base_rate + f64::from(difference) * SUCCESS_STEP_PER_LEVEL).clamp(MIN_SUCCESS_RATE, 1.0)
    }
}
