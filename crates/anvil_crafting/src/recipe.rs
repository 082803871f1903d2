//! # Recipes
//!
//! A recipe states what a craft needs (materials, tools, skills), what it
//! yields, how long it takes and how hard it is. Recipes are immutable once
//! built; all derived values (time, success chance, experience) are pure
//! functions of the recipe and the skill levels passed in.
//!
//! ## Curves
//!
//! Skill-based time shrinks toward a quarter of the base time:
//!
//! ```text
//! time = base * (0.25 + 0.75 / (1 + 0.1 * weighted_skill))
//! ```
//!
//! Success chance is expressed as failure odds that grow with difficulty and
//! shrink exponentially with skill surplus over the requirements:
//!
//! ```text
//! odds = (0.1 * difficulty + 0.05 * has_skill_requirements) * e^(-0.3 * surplus)
//! p    = 1 / (1 + odds)
//! ```
//!
//! A recipe with difficulty 0 and no skill requirement always succeeds.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::ExperienceConfig;
use crate::error::{AnvilError, AnvilResult};
use crate::ids::{ItemId, RecipeId, SkillId};
use crate::quality::MAX_QUALITY_LEVEL;

/// Materials on hand, by item.
pub type MaterialPool = HashMap<ItemId, u32>;
/// Tools on hand.
pub type ToolSet = HashSet<ItemId>;
/// Skill levels, by skill.
pub type SkillLevels = HashMap<SkillId, u32>;
/// Recorded quality level of individual tools.
pub type ToolQualities = HashMap<ItemId, u8>;

/// Lower bound of the skill-based time curve, as a share of base time.
const MIN_SKILL_TIME_FACTOR: f64 = 0.25;
/// How quickly weighted skill shortens skill-based crafts.
const SKILL_TIME_RATE: f64 = 0.1;
/// Failure odds contributed by each point of difficulty.
const DIFFICULTY_ODDS: f64 = 0.1;
/// Failure odds present whenever a recipe requires any skill.
const SKILL_REQUIREMENT_ODDS: f64 = 0.05;
/// Exponential decay of failure odds per point of skill surplus.
const SKILL_ODDS_DECAY: f64 = 0.3;
/// Floor for success probability of very hard recipes.
const MIN_SUCCESS_PROBABILITY: f64 = 0.01;

/// What a recipe makes, used for grouping and filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeCategory {
    /// Cooked or prepared food.
    Food,
    /// Drinks.
    Drink,
    /// Weapons.
    Weapon,
    /// Worn protection.
    Armor,
    /// Tools.
    Tool,
    /// Medicine and first aid.
    Medical,
    /// Chemistry products.
    Chemical,
    /// Electronics.
    Electronic,
    /// Intermediate materials.
    Material,
    /// Anything else.
    Other,
}

impl RecipeCategory {
    /// Content name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Drink => "drink",
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Tool => "tool",
            Self::Medical => "medical",
            Self::Chemical => "chemical",
            Self::Electronic => "electronic",
            Self::Material => "material",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RecipeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a recipe is performed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftType {
    /// General hand crafting.
    #[default]
    Craft,
    /// Cooking over heat.
    Cook,
    /// Metal forging.
    Forge,
    /// Sewing and leatherwork.
    Tailor,
    /// Putting parts together.
    Assemble,
    /// Taking an item apart.
    Disassemble,
}

/// A material the recipe consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    /// Preferred material.
    pub item_id: ItemId,
    /// Units consumed per craft.
    pub count: u32,
    /// Whether a listed substitute may stand in.
    #[serde(default)]
    pub substitutable: bool,
    /// Accepted substitutes, in order of preference.
    #[serde(default)]
    pub substitutes: Vec<ItemId>,
}

impl MaterialRequirement {
    /// A non-substitutable requirement.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>, count: u32) -> Self {
        Self {
            item_id: item_id.into(),
            count,
            substitutable: false,
            substitutes: Vec::new(),
        }
    }

    /// Allows the listed substitutes.
    #[must_use]
    pub fn with_substitutes(mut self, substitutes: Vec<ItemId>) -> Self {
        self.substitutable = !substitutes.is_empty();
        self.substitutes = substitutes;
        self
    }

    /// The item that would be consumed from `materials`, if any can cover the
    /// full count. The preferred material wins over substitutes.
    #[must_use]
    pub fn resolve<'a>(&'a self, materials: &MaterialPool) -> Option<&'a ItemId> {
        let held = |id: &ItemId| materials.get(id).copied().unwrap_or(0);
        if held(&self.item_id) >= self.count {
            return Some(&self.item_id);
        }
        if !self.substitutable {
            return None;
        }
        self.substitutes.iter().find(|&id| held(id) >= self.count)
    }
}

/// A tool the recipe needs on hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequirement {
    /// The tool.
    pub tool_id: ItemId,
    /// Lowest accepted quality level, if checked.
    #[serde(default)]
    pub min_quality: Option<u8>,
    /// Highest accepted quality level, if checked.
    #[serde(default)]
    pub max_quality: Option<u8>,
    /// Whether the tool is used up by a successful craft.
    #[serde(default)]
    pub consume: bool,
    /// Whether the tool needs a heat source.
    #[serde(default)]
    pub requires_heat: bool,
}

impl ToolRequirement {
    /// A reusable tool without a quality window.
    #[must_use]
    pub fn new(tool_id: impl Into<ItemId>) -> Self {
        Self {
            tool_id: tool_id.into(),
            min_quality: None,
            max_quality: None,
            consume: false,
            requires_heat: false,
        }
    }

    /// Marks the tool as consumed on success.
    #[must_use]
    pub fn consumed(mut self) -> Self {
        self.consume = true;
        self
    }

    /// Marks the tool as needing heat.
    #[must_use]
    pub fn heated(mut self) -> Self {
        self.requires_heat = true;
        self
    }

    /// Restricts the accepted quality level.
    #[must_use]
    pub fn with_quality_range(mut self, min: Option<u8>, max: Option<u8>) -> Self {
        self.min_quality = min.map(|q| q.min(MAX_QUALITY_LEVEL));
        self.max_quality = max.map(|q| q.min(MAX_QUALITY_LEVEL));
        self
    }

    /// True if `level` falls inside the quality window.
    #[must_use]
    pub fn accepts_quality(&self, level: u8) -> bool {
        self.min_quality.map_or(true, |min| level >= min)
            && self.max_quality.map_or(true, |max| level <= max)
    }
}

fn default_multiplier() -> f64 {
    1.0
}

/// A skill level the recipe asks for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    /// The skill.
    pub skill_id: SkillId,
    /// Minimum level.
    pub min_level: u32,
    /// Weight of this skill in time and success curves.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl SkillRequirement {
    /// A requirement with weight 1.
    #[must_use]
    pub fn new(skill_id: impl Into<SkillId>, min_level: u32) -> Self {
        Self {
            skill_id: skill_id.into(),
            min_level,
            multiplier: 1.0,
        }
    }
}

/// How the produced quantity of a result is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    /// Exactly `quantity`.
    #[default]
    Fixed,
    /// Uniform in `1..=quantity`.
    Random,
    /// `quantity` plus a bonus for skill above the requirement.
    SkillBased,
}

/// An item and an amount.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeItem {
    /// The item.
    pub item_id: ItemId,
    /// Amount.
    pub quantity: u32,
}

impl RecipeItem {
    /// Creates a new recipe item.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// One product of a recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOutput {
    /// The item produced.
    pub item_id: ItemId,
    /// Nominal amount.
    pub quantity: u32,
    /// How the amount is rolled.
    #[serde(default)]
    pub kind: QuantityKind,
    /// Extra items produced alongside, always fixed.
    #[serde(default)]
    pub byproducts: Vec<RecipeItem>,
}

impl RecipeOutput {
    /// A fixed-quantity output.
    #[must_use]
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            kind: QuantityKind::Fixed,
            byproducts: Vec::new(),
        }
    }

    /// Sets the quantity kind.
    #[must_use]
    pub fn with_kind(mut self, kind: QuantityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds a byproduct.
    #[must_use]
    pub fn with_byproduct(mut self, item_id: impl Into<ItemId>, quantity: u32) -> Self {
        self.byproducts.push(RecipeItem::new(item_id, quantity));
        self
    }
}

/// How the crafting time is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeKind {
    /// Always `base_time`.
    #[default]
    Fixed,
    /// Shortened by skill.
    SkillBased,
    /// `base_time` per unit of batch.
    QuantityBased,
}

/// Crafting time definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSpec {
    /// Base time in turns.
    pub base_time: f64,
    /// How the base is scaled.
    #[serde(default)]
    pub kind: TimeKind,
}

impl Default for TimeSpec {
    fn default() -> Self {
        Self {
            base_time: 0.0,
            kind: TimeKind::Fixed,
        }
    }
}

/// A material that is short, reported by [`Recipe::can_craft`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingMaterial {
    /// The preferred material.
    pub item_id: ItemId,
    /// Units needed.
    pub required: u32,
    /// Units held.
    pub have: u32,
}

/// A skill below the requirement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsufficientSkill {
    /// The skill.
    pub skill_id: SkillId,
    /// Level needed.
    pub required: u32,
    /// Level held.
    pub have: u32,
}

/// Itemized craftability report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CraftingCheckResult {
    /// True iff every gap list is empty.
    pub can_craft: bool,
    /// Materials that are short.
    pub missing_materials: Vec<MissingMaterial>,
    /// Tools that are absent or outside their quality window.
    pub missing_tools: Vec<ItemId>,
    /// Skills below their requirement.
    pub insufficient_skills: Vec<InsufficientSkill>,
    /// Time the craft would take.
    pub estimated_time: f64,
    /// Chance of success in `[0, 1]`.
    pub success_probability: f64,
}

impl CraftingCheckResult {
    /// Sum of level shortfalls over all insufficient skills.
    #[must_use]
    pub fn skill_gap(&self) -> u32 {
        self.insufficient_skills
            .iter()
            .map(|s| s.required.saturating_sub(s.have))
            .sum()
    }
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> u32 {
    1
}

/// A crafting recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe identifier.
    pub id: RecipeId,
    /// Human-readable name.
    pub name: String,
    /// What it makes.
    pub category: RecipeCategory,
    /// How it is performed.
    #[serde(default, rename = "type")]
    pub craft_type: CraftType,
    /// Consumed materials.
    #[serde(default)]
    pub materials: Vec<MaterialRequirement>,
    /// Required tools.
    #[serde(default)]
    pub tools: Vec<ToolRequirement>,
    /// Required skills.
    #[serde(default)]
    pub skills: Vec<SkillRequirement>,
    /// Products.
    #[serde(default)]
    pub results: Vec<RecipeOutput>,
    /// Time definition.
    #[serde(default)]
    pub time: TimeSpec,
    /// Difficulty rating.
    #[serde(default)]
    pub difficulty: u32,
    /// Units per batch; at least 1.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Known from the start.
    #[serde(default)]
    pub autolearn: bool,
    /// Can be learned later.
    #[serde(default = "default_true")]
    pub learnable: bool,
    /// Can be taken apart again.
    #[serde(default)]
    pub reversible: bool,
    /// Skills that gain experience from this recipe.
    #[serde(default)]
    pub related_skills: Vec<SkillId>,
}

impl Recipe {
    /// Creates an empty recipe.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecipe` if the id is empty.
    pub fn new(
        id: impl Into<RecipeId>,
        name: impl Into<String>,
        category: RecipeCategory,
    ) -> AnvilResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(AnvilError::InvalidRecipe {
                recipe_id: String::new(),
                reason: "recipe id must not be empty".to_string(),
            });
        }

        Ok(Self {
            id,
            name: name.into(),
            category,
            craft_type: CraftType::Craft,
            materials: Vec::new(),
            tools: Vec::new(),
            skills: Vec::new(),
            results: Vec::new(),
            time: TimeSpec::default(),
            difficulty: 0,
            batch_size: 1,
            autolearn: false,
            learnable: true,
            reversible: false,
            related_skills: Vec::new(),
        })
    }

    /// Sets the craft type.
    #[must_use]
    pub fn with_type(mut self, craft_type: CraftType) -> Self {
        self.craft_type = craft_type;
        self
    }

    /// Adds a material requirement.
    #[must_use]
    pub fn with_material(mut self, material: MaterialRequirement) -> Self {
        self.materials.push(material);
        self
    }

    /// Adds a tool requirement.
    #[must_use]
    pub fn with_tool(mut self, tool: ToolRequirement) -> Self {
        self.tools.push(tool);
        self
    }

    /// Adds a skill requirement.
    #[must_use]
    pub fn with_skill(mut self, skill: SkillRequirement) -> Self {
        self.skills.push(skill);
        self
    }

    /// Adds a product.
    #[must_use]
    pub fn with_result(mut self, output: RecipeOutput) -> Self {
        self.results.push(output);
        self
    }

    /// Sets the time definition.
    #[must_use]
    pub fn with_time(mut self, base_time: f64, kind: TimeKind) -> Self {
        self.time = TimeSpec {
            base_time: base_time.max(0.0),
            kind,
        };
        self
    }

    /// Sets the difficulty.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the batch size (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the learning flags.
    #[must_use]
    pub fn with_flags(mut self, autolearn: bool, learnable: bool, reversible: bool) -> Self {
        self.autolearn = autolearn;
        self.learnable = learnable;
        self.reversible = reversible;
        self
    }

    /// Adds a skill that gains experience.
    #[must_use]
    pub fn with_related_skill(mut self, skill: impl Into<SkillId>) -> Self {
        self.related_skills.push(skill.into());
        self
    }

    /// Checks invariants of deserialized content.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecipe` describing the first violation.
    pub fn validate(&self) -> AnvilResult<()> {
        let invalid = |reason: String| AnvilError::InvalidRecipe {
            recipe_id: self.id.to_string(),
            reason,
        };

        if self.id.is_empty() {
            return Err(invalid("recipe id must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1".to_string()));
        }
        if !(self.time.base_time.is_finite() && self.time.base_time >= 0.0) {
            return Err(invalid(format!("invalid base_time {}", self.time.base_time)));
        }
        for tool in &self.tools {
            let over = |q: Option<u8>| q.is_some_and(|q| q > MAX_QUALITY_LEVEL);
            if over(tool.min_quality) || over(tool.max_quality) {
                return Err(invalid(format!(
                    "tool {} quality exceeds {MAX_QUALITY_LEVEL}",
                    tool.tool_id
                )));
            }
            if let (Some(min), Some(max)) = (tool.min_quality, tool.max_quality) {
                if min > max {
                    return Err(invalid(format!(
                        "tool {} quality window {min}..{max} is inverted",
                        tool.tool_id
                    )));
                }
            }
        }
        for skill in &self.skills {
            if !(skill.multiplier.is_finite() && skill.multiplier >= 0.0) {
                return Err(invalid(format!(
                    "skill {} multiplier must be non-negative",
                    skill.skill_id
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a recipe from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed text and `InvalidRecipe` for bad content.
    pub fn from_json(content: &str) -> AnvilResult<Self> {
        let recipe: Self = serde_json::from_str(content)?;
        if let Err(err) = recipe.validate() {
            tracing::warn!(recipe = %recipe.id, error = %err, "rejected recipe definition");
            return Err(err);
        }
        Ok(recipe)
    }

    /// Serializes the recipe to JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json(&self) -> AnvilResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks every requirement against the given pools.
    ///
    /// Gaps are collected for all three requirement kinds, so one call
    /// reports everything that is missing.
    #[must_use]
    pub fn can_craft(
        &self,
        materials: &MaterialPool,
        tools: &ToolSet,
        skills: &SkillLevels,
    ) -> CraftingCheckResult {
        self.check(materials, tools, skills, None)
    }

    /// Like [`Recipe::can_craft`], also holding tools to their quality window
    /// when the tool has a recorded level.
    #[must_use]
    pub fn can_craft_with_qualities(
        &self,
        materials: &MaterialPool,
        tools: &ToolSet,
        skills: &SkillLevels,
        tool_qualities: &ToolQualities,
    ) -> CraftingCheckResult {
        self.check(materials, tools, skills, Some(tool_qualities))
    }

    fn check(
        &self,
        materials: &MaterialPool,
        tools: &ToolSet,
        skills: &SkillLevels,
        tool_qualities: Option<&ToolQualities>,
    ) -> CraftingCheckResult {
        let missing_materials: Vec<MissingMaterial> = self
            .allocate(materials)
            .into_iter()
            .filter_map(Result::err)
            .collect();

        let missing_tools: Vec<ItemId> = self
            .tools
            .iter()
            .filter(|t| {
                if !tools.contains(&t.tool_id) {
                    return true;
                }
                tool_qualities
                    .and_then(|q| q.get(&t.tool_id))
                    .is_some_and(|&level| !t.accepts_quality(level))
            })
            .map(|t| t.tool_id.clone())
            .collect();

        let insufficient_skills: Vec<InsufficientSkill> = self
            .skills
            .iter()
            .filter_map(|s| {
                let have = skills.get(&s.skill_id).copied().unwrap_or(0);
                (have < s.min_level).then(|| InsufficientSkill {
                    skill_id: s.skill_id.clone(),
                    required: s.min_level,
                    have,
                })
            })
            .collect();

        CraftingCheckResult {
            can_craft: missing_materials.is_empty()
                && missing_tools.is_empty()
                && insufficient_skills.is_empty(),
            missing_materials,
            missing_tools,
            insufficient_skills,
            estimated_time: self.calculate_time(Some(skills)),
            success_probability: self.calculate_success_probability(Some(skills)),
        }
    }

    /// The item each material requirement consumes, in recipe order.
    ///
    /// Units claimed by an earlier requirement are not available to later
    /// ones, so a substitute never counts stock another line already uses.
    /// `None` marks a requirement the remaining pool cannot cover.
    #[must_use]
    pub fn allocate_materials(&self, materials: &MaterialPool) -> Vec<Option<ItemId>> {
        self.allocate(materials).into_iter().map(Result::ok).collect()
    }

    fn allocate(&self, materials: &MaterialPool) -> Vec<Result<ItemId, MissingMaterial>> {
        let mut free = materials.clone();
        self.materials
            .iter()
            .map(|m| match m.resolve(&free).cloned() {
                Some(id) => {
                    if let Some(held) = free.get_mut(&id) {
                        *held = held.saturating_sub(m.count);
                    }
                    Ok(id)
                }
                None => Err(MissingMaterial {
                    item_id: m.item_id.clone(),
                    required: m.count,
                    have: free.get(&m.item_id).copied().unwrap_or(0),
                }),
            })
            .collect()
    }

    /// Time to craft one batch.
    #[must_use]
    pub fn calculate_time(&self, skill_levels: Option<&SkillLevels>) -> f64 {
        let base = self.time.base_time;
        match self.time.kind {
            TimeKind::Fixed => base,
            TimeKind::QuantityBased => base * f64::from(self.batch_size),
            TimeKind::SkillBased => {
                let weighted = skill_levels.map_or(0.0, |levels| self.weighted_skill(levels));
                base * (MIN_SKILL_TIME_FACTOR
                    + (1.0 - MIN_SKILL_TIME_FACTOR) / (1.0 + SKILL_TIME_RATE * weighted))
            }
        }
    }

    /// Chance that an attempt succeeds, in `(0, 1]`.
    #[must_use]
    pub fn calculate_success_probability(&self, skill_levels: Option<&SkillLevels>) -> f64 {
        let mut odds = DIFFICULTY_ODDS * f64::from(self.difficulty);
        if !self.skills.is_empty() {
            odds += SKILL_REQUIREMENT_ODDS;
        }
        if odds <= 0.0 {
            return 1.0;
        }

        let empty = SkillLevels::new();
        let surplus = self.skill_surplus(skill_levels.unwrap_or(&empty));
        let odds = odds * (-SKILL_ODDS_DECAY * surplus).exp();

        (1.0 / (1.0 + odds)).clamp(MIN_SUCCESS_PROBABILITY, 1.0)
    }

    /// Experience per related skill with the default balance table.
    #[must_use]
    pub fn calculate_experience_gain(&self, success: bool) -> HashMap<SkillId, u32> {
        self.calculate_experience_gain_with(success, &ExperienceConfig::default())
    }

    /// Experience per related skill; empty on failure.
    #[must_use]
    pub fn calculate_experience_gain_with(
        &self,
        success: bool,
        config: &ExperienceConfig,
    ) -> HashMap<SkillId, u32> {
        if !success {
            return HashMap::new();
        }
        let amount = config
            .base
            .saturating_add(self.difficulty.saturating_mul(config.per_difficulty));
        self.related_skills
            .iter()
            .map(|skill| (skill.clone(), amount))
            .collect()
    }

    /// Weighted sum of held levels over the skill requirements.
    fn weighted_skill(&self, levels: &SkillLevels) -> f64 {
        self.skills
            .iter()
            .map(|s| s.multiplier * f64::from(levels.get(&s.skill_id).copied().unwrap_or(0)))
            .sum()
    }

    /// Weighted sum of (held - required) over the skill requirements.
    fn skill_surplus(&self, levels: &SkillLevels) -> f64 {
        self.skills
            .iter()
            .map(|s| {
                let have = f64::from(levels.get(&s.skill_id).copied().unwrap_or(0));
                s.multiplier * (have - f64::from(s.min_level))
            })
            .sum()
    }

    /// Levels above the requirement of the best-covered skill, 0 without
    /// skill requirements.
    #[must_use]
    pub fn best_skill_surplus(&self, levels: &SkillLevels) -> u32 {
        self.skills
            .iter()
            .map(|s| {
                levels
                    .get(&s.skill_id)
                    .copied()
                    .unwrap_or(0)
                    .saturating_sub(s.min_level)
            })
            .max()
            .unwrap_or(0)
    }

    /// Highest minimum level among the skill requirements.
    #[must_use]
    pub fn max_skill_requirement(&self) -> u32 {
        self.skills.iter().map(|s| s.min_level).max().unwrap_or(0)
    }

    /// Builds the disassembly recipe of a reversible recipe.
    ///
    /// Products become materials and materials become fixed products. Tools
    /// are kept except those the forward recipe used up.
    #[must_use]
    pub fn reversed(&self) -> Option<Self> {
        if !self.reversible {
            return None;
        }

        Some(Self {
            id: RecipeId::new(format!("{}_disassembly", self.id)),
            name: format!("Disassemble {}", self.name),
            category: self.category,
            craft_type: CraftType::Disassemble,
            materials: self
                .results
                .iter()
                .map(|r| MaterialRequirement::new(r.item_id.clone(), r.quantity))
                .collect(),
            tools: self.tools.iter().filter(|t| !t.consume).cloned().collect(),
            skills: self.skills.clone(),
            results: self
                .materials
                .iter()
                .map(|m| RecipeOutput::new(m.item_id.clone(), m.count))
                .collect(),
            time: self.time,
            difficulty: self.difficulty,
            batch_size: 1,
            autolearn: false,
            learnable: true,
            reversible: false,
            related_skills: self.related_skills.clone(),
        })
    }

    /// Can be learned after creation.
    #[must_use]
    pub const fn is_learnable(&self) -> bool {
        self.learnable
    }

    /// Known from the start.
    #[must_use]
    pub const fn is_auto_learn(&self) -> bool {
        self.autolearn
    }

    /// Can be disassembled.
    #[must_use]
    pub const fn is_reversible(&self) -> bool {
        self.reversible
    }

    /// True if any skill requirement names `skill`.
    #[must_use]
    pub fn requires_skill(&self, skill: &SkillId) -> bool {
        self.skills.iter().any(|s| &s.skill_id == skill)
    }

    /// True if any tool requirement names `tool`.
    #[must_use]
    pub fn requires_tool(&self, tool: &ItemId) -> bool {
        self.tools.iter().any(|t| &t.tool_id == tool)
    }

    /// True if any required tool needs heat.
    #[must_use]
    pub fn requires_heat(&self) -> bool {
        self.tools.iter().any(|t| t.requires_heat)
    }

    /// Food recipe.
    #[must_use]
    pub fn is_food_recipe(&self) -> bool {
        self.category == RecipeCategory::Food
    }

    /// Drink recipe.
    #[must_use]
    pub fn is_drink_recipe(&self) -> bool {
        self.category == RecipeCategory::Drink
    }

    /// Weapon recipe.
    #[must_use]
    pub fn is_weapon_recipe(&self) -> bool {
        self.category == RecipeCategory::Weapon
    }

    /// Armor recipe.
    #[must_use]
    pub fn is_armor_recipe(&self) -> bool {
        self.category == RecipeCategory::Armor
    }

    /// Tool recipe.
    #[must_use]
    pub fn is_tool_recipe(&self) -> bool {
        self.category == RecipeCategory::Tool
    }

    /// Medical recipe.
    #[must_use]
    pub fn is_medical_recipe(&self) -> bool {
        self.category == RecipeCategory::Medical
    }

    /// Chemical recipe.
    #[must_use]
    pub fn is_chemical_recipe(&self) -> bool {
        self.category == RecipeCategory::Chemical
    }

    /// Electronic recipe.
    #[must_use]
    pub fn is_electronic_recipe(&self) -> bool {
        self.category == RecipeCategory::Electronic
    }

    /// Material recipe.
    #[must_use]
    pub fn is_material_recipe(&self) -> bool {
        self.category == RecipeCategory::Material
    }

    /// Uncategorized recipe.
    #[must_use]
    pub fn is_other_recipe(&self) -> bool {
        self.category == RecipeCategory::Other
    }
}
