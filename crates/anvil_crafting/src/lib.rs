//! # Anvil Crafting Engine
//!
//! Recipe-driven crafting for survival and role-playing games.
//!
//! ## Design Principles
//!
//! 1. **Value semantics** - every mutation returns a new `CraftingManager`; old snapshots stay valid
//! 2. **Transactional crafting** - a rejected craft never touches the pools
//! 3. **Injected randomness** - success rolls come from a caller-supplied `RandomSource`
//! 4. **Data-driven content** - recipes load from JSON, balance tables from TOML
//!
//! ## Example
//!
//! ```rust
//! use anvil_crafting::{
//!     CraftingManager, MaterialRequirement, Recipe, RecipeCategory, RecipeOutput, ScriptedRandom,
//! };
//!
//! let knife = Recipe::new("stone_knife", "Stone Knife", RecipeCategory::Tool)
//!     .unwrap()
//!     .with_material(MaterialRequirement::new("stone", 1))
//!     .with_material(MaterialRequirement::new("stick", 1))
//!     .with_result(RecipeOutput::new("stone_knife", 1))
//!     .with_flags(true, true, false);
//!
//! let manager = CraftingManager::create(vec![knife])
//!     .add_material("stone", 2)
//!     .add_material("stick", 1);
//!
//! let (after, result) = manager.craft("stone_knife", &mut ScriptedRandom::always_succeed());
//! assert!(result.success);
//! assert_eq!(after.material_count("stone"), 1);
//! assert_eq!(manager.material_count("stone"), 2);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod batch;
pub mod config;
pub mod error;
pub mod helper;
pub mod ids;
pub mod manager;
pub mod proficiency;
pub mod quality;
pub mod random;
pub mod recipe;

pub use batch::{
    BatchLevel, BatchOptimizationParams, BatchOptimizationResult, BatchOptimizer, LogisticParams,
    DEFAULT_MAX_BATCH,
};
pub use config::{CraftingConfig, ExperienceConfig};
pub use error::{AnvilError, AnvilResult};
pub use helper::{
    AssistantAdvice, DuplicateGroup, DuplicateKind, RecipeFilter, RecipeHelper, RecipeStatistics,
    SortKey, SortOrder,
};
pub use ids::{ItemId, ProficiencyId, QualityId, RecipeId, SkillId};
pub use manager::{
    CraftModifiers, CraftOutcome, CraftRequest, CraftingManager, CraftingResult, CraftingState,
};
pub use proficiency::{Proficiency, ProficiencyDefinition};
pub use quality::{
    InsufficientQuality, QualityCheckResult, QualityData, QualityDefinition, QualityManager,
    QualityRequirement, MAX_QUALITY_LEVEL,
};
pub use random::{seeded, RandomSource, ScriptedRandom};
pub use recipe::{
    CraftType, CraftingCheckResult, InsufficientSkill, MaterialPool, MaterialRequirement,
    MissingMaterial, QuantityKind, Recipe, RecipeCategory, RecipeItem, RecipeOutput,
    SkillLevels, SkillRequirement, TimeKind, TimeSpec, ToolQualities, ToolRequirement, ToolSet,
};
