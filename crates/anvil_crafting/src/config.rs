//! # Balance Configuration
//!
//! All tunable crafting constants live here and can be loaded from TOML.
//! Every field has a default, so a partial file only overrides what it names.
//!
//! ```toml
//! failure_material_ratio = 0.5
//! failure_time_ratio = 0.5
//!
//! [experience]
//! base = 10
//! per_difficulty = 5
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnvilError, AnvilResult};

/// Experience awarded per related skill on a successful craft.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// Flat amount every related skill receives.
    pub base: u32,
    /// Additional amount per point of recipe difficulty.
    pub per_difficulty: u32,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            base: 10,
            per_difficulty: 5,
        }
    }
}

/// Crafting balance table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingConfig {
    /// Share of each material lost on a failed attempt (rounded up).
    pub failure_material_ratio: f64,
    /// Share of the estimated time spent on a failed attempt.
    pub failure_time_ratio: f64,
    /// Experience rewards.
    pub experience: ExperienceConfig,
    /// Skill levels above the requirement needed for one extra unit of a
    /// skill-based result.
    pub skill_bonus_divisor: u32,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            failure_material_ratio: 0.5,
            failure_time_ratio: 0.5,
            experience: ExperienceConfig::default(),
            skill_bonus_divisor: 2,
        }
    }
}

impl CraftingConfig {
    /// Parses a balance table from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or a ratio is outside `[0, 1]`.
    pub fn from_toml_str(content: &str) -> AnvilResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every ratio is usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> AnvilResult<()> {
        if !(0.0..=1.0).contains(&self.failure_material_ratio) {
            return Err(AnvilError::InvalidConfig(format!(
                "failure_material_ratio must be within [0, 1], got {}",
                self.failure_material_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.failure_time_ratio) {
            return Err(AnvilError::InvalidConfig(format!(
                "failure_time_ratio must be within [0, 1], got {}",
                self.failure_time_ratio
            )));
        }
        if self.skill_bonus_divisor == 0 {
            return Err(AnvilError::InvalidConfig(
                "skill_bonus_divisor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CraftingConfig::from_toml_str("failure_time_ratio = 0.25").unwrap();
        assert!((config.failure_time_ratio - 0.25).abs() < f64::EPSILON);
        assert!((config.failure_material_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.experience, ExperienceConfig::default());
    }

    #[test]
    fn test_nested_experience_table() {
        let config = CraftingConfig::from_toml_str("[experience]\nbase = 20\n").unwrap();
        assert_eq!(config.experience.base, 20);
        assert_eq!(config.experience.per_difficulty, 5);
    }

    #[test]
    fn test_rejects_out_of_range_ratio() {
        let err = CraftingConfig::from_toml_str("failure_material_ratio = 1.5").unwrap_err();
        assert!(matches!(err, AnvilError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = CraftingConfig::from_toml_str("failure_time_ratio = ").unwrap_err();
        assert!(matches!(err, AnvilError::Toml(_)));
    }
}
