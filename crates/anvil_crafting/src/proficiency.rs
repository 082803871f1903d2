//! # Proficiencies
//!
//! A proficiency is a leveled track (e.g. "Blacksmithing") layered on top of
//! raw skills. Its level speeds up crafting, raises success chance and allows
//! bigger batches for the recipe categories it covers.
//!
//! ## Progression
//!
//! ```text
//! xp to leave level n = floor(100 * (n + 1) * difficulty_multiplier)
//! ```
//!
//! At `max_level` no more experience is needed (or accepted).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AnvilError, AnvilResult};
use crate::ids::ProficiencyId;
use crate::recipe::{Recipe, RecipeCategory};

/// Experience per level before the difficulty multiplier.
const EXPERIENCE_PER_LEVEL: f64 = 100.0;
/// Speed multiplier reduction per level.
const SPEED_STEP: f64 = 0.1;
/// Success bonus per level.
const SUCCESS_STEP: f64 = 0.05;
/// Cap on the success bonus.
const MAX_SUCCESS_BONUS: f64 = 0.5;
/// Cap on the batch size modifier.
const MAX_BATCH_MODIFIER: u32 = 5;

/// Static definition of a proficiency track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProficiencyDefinition {
    /// Unique identifier.
    pub id: ProficiencyId,
    /// Free-form grouping (e.g. "metalworking").
    pub category: String,
    /// Scales experience needed per level; must be positive.
    pub difficulty_multiplier: f64,
    /// Recipe categories this proficiency affects.
    #[serde(default)]
    pub related_categories: Vec<RecipeCategory>,
    /// Highest reachable level.
    pub max_level: u32,
}

impl ProficiencyDefinition {
    /// Creates a validated definition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProficiency` if the multiplier is not a positive number.
    pub fn new(
        id: impl Into<ProficiencyId>,
        category: impl Into<String>,
        difficulty_multiplier: f64,
        max_level: u32,
    ) -> AnvilResult<Self> {
        let definition = Self {
            id: id.into(),
            category: category.into(),
            difficulty_multiplier,
            related_categories: Vec::new(),
            max_level,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Sets the recipe categories this proficiency covers.
    #[must_use]
    pub fn with_related_categories(mut self, categories: Vec<RecipeCategory>) -> Self {
        self.related_categories = categories;
        self
    }

    /// Checks the definition's invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProficiency` describing the violation.
    pub fn validate(&self) -> AnvilResult<()> {
        if !(self.difficulty_multiplier.is_finite() && self.difficulty_multiplier > 0.0) {
            return Err(AnvilError::InvalidProficiency {
                proficiency_id: self.id.to_string(),
                reason: format!(
                    "difficulty_multiplier must be positive, got {}",
                    self.difficulty_multiplier
                ),
            });
        }
        Ok(())
    }

    /// Experience needed to advance from `level` to the next one.
    ///
    /// Infinite at or above `max_level`.
    #[must_use]
    pub fn experience_for_level(&self, level: u32) -> f64 {
        if level >= self.max_level {
            return f64::INFINITY;
        }
        (EXPERIENCE_PER_LEVEL * f64::from(level + 1) * self.difficulty_multiplier).floor()
    }

    /// Time multiplier at `level`: 10% faster per level, never below half time.
    #[must_use]
    pub fn speed_multiplier(&self, level: u32) -> f64 {
        (1.0 - f64::from(level) * SPEED_STEP).clamp(0.5, 1.5)
    }

    /// Additive success bonus at `level`.
    #[must_use]
    pub fn success_rate_bonus(&self, level: u32) -> f64 {
        (f64::from(level) * SUCCESS_STEP).min(MAX_SUCCESS_BONUS)
    }

    /// Extra batch units allowed at `level`.
    #[must_use]
    pub fn batch_size_modifier(&self, level: u32) -> u32 {
        level.min(MAX_BATCH_MODIFIER)
    }

    /// True if the proficiency affects recipes of `category`.
    #[must_use]
    pub fn covers(&self, category: RecipeCategory) -> bool {
        self.related_categories.contains(&category)
    }
}

/// A character's progress on one proficiency track.
///
/// The definition is shared between every character holding the track.
#[derive(Clone, Debug, PartialEq)]
pub struct Proficiency {
    definition: Arc<ProficiencyDefinition>,
    level: u32,
    experience: f64,
    is_unlocked: bool,
}

impl Proficiency {
    /// A fresh, locked proficiency at level 0.
    #[must_use]
    pub fn new(definition: Arc<ProficiencyDefinition>) -> Self {
        Self {
            definition,
            level: 0,
            experience: 0.0,
            is_unlocked: false,
        }
    }

    /// The shared definition.
    #[must_use]
    pub fn definition(&self) -> &ProficiencyDefinition {
        &self.definition
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience accumulated toward the next level.
    #[must_use]
    pub const fn experience(&self) -> f64 {
        self.experience
    }

    /// Whether experience is being accepted.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.is_unlocked
    }

    /// True once the track cannot advance further.
    #[must_use]
    pub fn is_max_level(&self) -> bool {
        self.level >= self.definition.max_level
    }

    /// Returns an unlocked copy.
    #[must_use]
    pub fn unlock(&self) -> Self {
        Self {
            is_unlocked: true,
            ..self.clone()
        }
    }

    /// Remaining experience before the next level, 0 at max level.
    #[must_use]
    pub fn experience_to_next_level(&self) -> f64 {
        if self.is_max_level() {
            return 0.0;
        }
        (self.definition.experience_for_level(self.level) - self.experience).max(0.0)
    }

    /// Returns a copy with `amount` experience applied.
    ///
    /// Locked tracks ignore experience, as do amounts that are not a finite
    /// positive number. Large amounts may cross several levels at once;
    /// anything past the max level is discarded.
    #[must_use]
    pub fn gain_experience(&self, amount: f64) -> Self {
        if !self.is_unlocked || self.is_max_level() || !(amount.is_finite() && amount > 0.0) {
            return self.clone();
        }

        let mut level = self.level;
        let mut experience = self.experience + amount;

        loop {
            let needed = self.definition.experience_for_level(level);
            if experience < needed {
                break;
            }
            experience -= needed;
            level += 1;
            if level >= self.definition.max_level {
                experience = 0.0;
                break;
            }
        }

        Self {
            definition: Arc::clone(&self.definition),
            level,
            experience,
            is_unlocked: true,
        }
    }

    /// Returns a copy at `level` (clamped to the max) with experience reset.
    #[must_use]
    pub fn set_level(&self, level: u32) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            level: level.min(self.definition.max_level),
            experience: 0.0,
            is_unlocked: self.is_unlocked,
        }
    }

    /// Time multiplier at the current level.
    #[must_use]
    pub fn speed_multiplier(&self) -> f64 {
        self.definition.speed_multiplier(self.level)
    }

    /// Success bonus at the current level.
    #[must_use]
    pub fn success_rate_bonus(&self) -> f64 {
        self.definition.success_rate_bonus(self.level)
    }

    /// Batch modifier at the current level.
    #[must_use]
    pub fn batch_size_modifier(&self) -> u32 {
        self.definition.batch_size_modifier(self.level)
    }

    /// True if this track is unlocked and covers the recipe's category.
    #[must_use]
    pub fn applies_to(&self, recipe: &Recipe) -> bool {
        self.is_unlocked && self.definition.covers(recipe.category)
    }
}
