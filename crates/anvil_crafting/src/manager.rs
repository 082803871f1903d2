//! # Crafting Manager
//!
//! **Copy-on-Write Crafting State**
//!
//! The manager holds everything a character brings to the workbench: the
//! recipe catalog, learned recipes, materials, tools and skill levels. It is
//! a value type. Every mutator returns a new manager and leaves the original
//! untouched, so a caller can keep the pre-craft state around for undo or
//! comparison without copying anything by hand.
//!
//! ## The Craft Transaction
//!
//! ```text
//! craft(id) ──> recipe known? ──no──> (unchanged, UnknownRecipe)
//!                    │
//!              requirements met? ──no──> (unchanged, RequirementsNotMet)
//!                    │
//!               roll success
//!              ┌─────┴──────┐
//!           failure      success
//!        lose ceil(n/2)  consume all materials
//!        of each         and flagged tools,
//!        material,       roll products,
//!        half time       award experience
//! ```
//!
//! Nothing on this path returns an error. The random source is supplied by
//! the caller.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::batch::{BatchOptimizationParams, BatchOptimizationResult, BatchOptimizer};
use crate::config::CraftingConfig;
use crate::error::AnvilResult;
use crate::ids::{ItemId, RecipeId, SkillId};
use crate::proficiency::Proficiency;
use crate::quality::{QualityManager, MAX_QUALITY_LEVEL};
use crate::random::RandomSource;
use crate::recipe::{
    CraftingCheckResult, MaterialPool, QuantityKind, Recipe, RecipeItem, RecipeOutput,
    SkillLevels, ToolQualities, ToolSet,
};

/// Difficulty points that add one unit to the batch difficulty multiplier.
const DIFFICULTY_BATCH_SCALE: f64 = 10.0;

/// Bonuses from proficiencies and tool quality, supplied by the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CraftModifiers {
    /// Multiplies the estimated time.
    pub time_multiplier: f64,
    /// Added to the success probability.
    pub success_bonus: f64,
    /// Tool quality above (positive) or below the requirement.
    pub quality_difference: i32,
}

impl Default for CraftModifiers {
    fn default() -> Self {
        Self {
            time_multiplier: 1.0,
            success_bonus: 0.0,
            quality_difference: 0,
        }
    }
}

impl CraftModifiers {
    /// Takes the best speed and success bonus among the proficiencies that
    /// apply to `recipe`.
    #[must_use]
    pub fn from_proficiencies(proficiencies: &[Proficiency], recipe: &Recipe) -> Self {
        proficiencies
            .iter()
            .filter(|p| p.applies_to(recipe))
            .fold(Self::default(), |acc, p| Self {
                time_multiplier: acc.time_multiplier.min(p.speed_multiplier()),
                success_bonus: acc.success_bonus.max(p.success_rate_bonus()),
                quality_difference: acc.quality_difference,
            })
    }

    /// Sets the tool quality surplus.
    #[must_use]
    pub fn with_quality_difference(mut self, difference: i32) -> Self {
        self.quality_difference = difference;
        self
    }

    /// Applies speed and quality to a base time.
    #[must_use]
    pub fn apply_time(&self, base_time: f64) -> f64 {
        QualityManager::adjust_time_by_quality(self.quality_difference, base_time * self.time_multiplier)
    }

    /// Applies the success bonus and quality to a base probability.
    #[must_use]
    pub fn apply_success(&self, base_rate: f64) -> f64 {
        let rate = (base_rate + self.success_bonus).clamp(0.0, 1.0);
        if self.quality_difference == 0 {
            rate
        } else {
            QualityManager::adjust_success_rate_by_quality(self.quality_difference, rate)
        }
    }
}

/// Why a craft attempt ended the way it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftOutcome {
    /// Items were produced.
    Crafted,
    /// The success roll failed; part of the materials were lost.
    Failed,
    /// No recipe with that id.
    UnknownRecipe,
    /// Materials, tools or skills were missing; nothing was consumed.
    RequirementsNotMet,
}

/// Consequences of one craft attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct CraftingResult {
    /// The recipe attempted.
    pub recipe_id: RecipeId,
    /// How the attempt ended.
    pub outcome: CraftOutcome,
    /// True only for [`CraftOutcome::Crafted`].
    pub success: bool,
    /// Items made, including byproducts.
    pub produced_items: Vec<RecipeItem>,
    /// Materials used up.
    pub consumed_materials: Vec<RecipeItem>,
    /// Tools used up.
    pub consumed_tools: Vec<ItemId>,
    /// Experience per skill.
    pub experience_gained: HashMap<SkillId, u32>,
    /// Time the attempt took.
    pub time_spent: f64,
}

impl CraftingResult {
    /// A result with no consumption, production or time.
    #[must_use]
    pub fn rejected(recipe_id: RecipeId, outcome: CraftOutcome) -> Self {
        Self {
            recipe_id,
            outcome,
            success: false,
            produced_items: Vec::new(),
            consumed_materials: Vec::new(),
            consumed_tools: Vec::new(),
            experience_gained: HashMap::new(),
            time_spent: 0.0,
        }
    }

    /// Total produced units of `item`.
    #[must_use]
    pub fn produced(&self, item: &str) -> u32 {
        self.produced_items
            .iter()
            .filter(|i| i.item_id.as_str() == item)
            .map(|i| i.quantity)
            .sum()
    }
}

/// One line of a [`CraftingManager::craft_multiple`] request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftRequest {
    /// Recipe to craft.
    pub recipe_id: RecipeId,
    /// Number of attempts.
    pub count: u32,
}

impl CraftRequest {
    /// Creates a request line.
    #[must_use]
    pub fn new(recipe_id: impl Into<RecipeId>, count: u32) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            count,
        }
    }
}

/// Serializable snapshot of a manager.
///
/// Collections are ordered so the same state always serializes the same way.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CraftingState {
    /// The catalog, sorted by id.
    pub recipes: Vec<Recipe>,
    /// Learned recipe ids.
    #[serde(default)]
    pub learned_recipes: BTreeSet<RecipeId>,
    /// Material counts.
    #[serde(default)]
    pub available_materials: BTreeMap<ItemId, u32>,
    /// Tools on hand.
    #[serde(default)]
    pub available_tools: BTreeSet<ItemId>,
    /// Recorded tool quality levels.
    #[serde(default)]
    pub tool_qualities: BTreeMap<ItemId, u8>,
    /// Skill levels.
    #[serde(default)]
    pub skill_levels: BTreeMap<SkillId, u32>,
    /// Balance table.
    #[serde(default)]
    pub config: CraftingConfig,
}

/// A character's crafting state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CraftingManager {
    /// Catalog, shared between every version of this manager.
    recipes: Arc<HashMap<RecipeId, Recipe>>,
    /// Recipes the character knows.
    learned: HashSet<RecipeId>,
    /// Materials on hand; never holds zero counts.
    materials: MaterialPool,
    /// Tools on hand.
    tools: ToolSet,
    /// Quality level of tools that have one recorded.
    tool_qualities: ToolQualities,
    /// Skill levels.
    skills: SkillLevels,
    /// Balance table.
    config: CraftingConfig,
}

impl CraftingManager {
    /// Builds a manager over `recipes`, knowing every autolearn recipe.
    ///
    /// A duplicate id replaces the earlier recipe.
    #[must_use]
    pub fn create(recipes: Vec<Recipe>) -> Self {
        let mut catalog = HashMap::with_capacity(recipes.len());
        for recipe in recipes {
            if catalog.contains_key(&recipe.id) {
                tracing::warn!(recipe = %recipe.id, "duplicate recipe id, keeping the later definition");
            }
            catalog.insert(recipe.id.clone(), recipe);
        }

        let learned = catalog
            .values()
            .filter(|r| r.is_auto_learn())
            .map(|r| r.id.clone())
            .collect();

        Self {
            recipes: Arc::new(catalog),
            learned,
            ..Self::default()
        }
    }

    /// A manager with an empty catalog.
    #[must_use]
    pub fn create_default() -> Self {
        Self::default()
    }

    /// Replaces the balance table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the table fails [`CraftingConfig::validate`];
    /// the manager is dropped unchanged in that case.
    pub fn with_config(mut self, config: CraftingConfig) -> AnvilResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The balance table.
    #[must_use]
    pub const fn config(&self) -> &CraftingConfig {
        &self.config
    }

    /// Looks up a recipe.
    #[must_use]
    pub fn recipe(&self, recipe_id: &str) -> Option<&Recipe> {
        self.recipes.get(recipe_id)
    }

    /// All recipes, in no particular order.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Number of recipes in the catalog.
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Learned recipe ids.
    #[must_use]
    pub const fn learned_recipes(&self) -> &HashSet<RecipeId> {
        &self.learned
    }

    /// True if the recipe is learned.
    #[must_use]
    pub fn is_learned(&self, recipe_id: &str) -> bool {
        self.learned.contains(recipe_id)
    }

    /// Materials on hand.
    #[must_use]
    pub const fn materials(&self) -> &MaterialPool {
        &self.materials
    }

    /// Units of one material on hand.
    #[must_use]
    pub fn material_count(&self, item: &str) -> u32 {
        self.materials.get(item).copied().unwrap_or(0)
    }

    /// Tools on hand.
    #[must_use]
    pub const fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// True if the tool is on hand.
    #[must_use]
    pub fn has_tool(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    /// Recorded tool quality levels.
    #[must_use]
    pub const fn tool_qualities(&self) -> &ToolQualities {
        &self.tool_qualities
    }

    /// Skill levels.
    #[must_use]
    pub const fn skill_levels(&self) -> &SkillLevels {
        &self.skills
    }

    /// Level of one skill, 0 if unknown.
    #[must_use]
    pub fn skill_level(&self, skill: &str) -> u32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    /// Returns a manager that knows `recipe_id`, if it exists and is learnable.
    #[must_use]
    pub fn learn_recipe(&self, recipe_id: &str) -> Self {
        match self.recipes.get(recipe_id) {
            Some(recipe) if recipe.is_learnable() => {
                let mut next = self.clone();
                next.learned.insert(recipe.id.clone());
                next
            }
            Some(_) => {
                tracing::trace!(recipe = recipe_id, "recipe is not learnable");
                self.clone()
            }
            None => {
                tracing::trace!(recipe = recipe_id, "cannot learn unknown recipe");
                self.clone()
            }
        }
    }

    /// Returns a manager with `count` more of `item`.
    #[must_use]
    pub fn add_material(&self, item: impl Into<ItemId>, count: u32) -> Self {
        let mut next = self.clone();
        if count > 0 {
            let entry = next.materials.entry(item.into()).or_insert(0);
            *entry = entry.saturating_add(count);
        }
        next
    }

    /// Returns a manager with up to `count` fewer of `item`.
    ///
    /// Counts stop at zero and zero entries are dropped.
    #[must_use]
    pub fn remove_material(&self, item: impl Into<ItemId>, count: u32) -> Self {
        let mut next = self.clone();
        next.take_material(&item.into(), count);
        next
    }

    /// Returns a manager holding `tool`.
    #[must_use]
    pub fn add_tool(&self, tool: impl Into<ItemId>) -> Self {
        let mut next = self.clone();
        next.tools.insert(tool.into());
        next
    }

    /// Returns a manager holding `tool` at a recorded quality level.
    #[must_use]
    pub fn add_tool_with_quality(&self, tool: impl Into<ItemId>, level: u8) -> Self {
        let tool = tool.into();
        let mut next = self.clone();
        next.tool_qualities.insert(tool.clone(), level.min(MAX_QUALITY_LEVEL));
        next.tools.insert(tool);
        next
    }

    /// Returns a manager without `tool`.
    #[must_use]
    pub fn remove_tool(&self, tool: &str) -> Self {
        let mut next = self.clone();
        next.drop_tool(tool);
        next
    }

    /// Returns a manager with `skill` at `level`.
    #[must_use]
    pub fn set_skill_level(&self, skill: impl Into<SkillId>, level: u32) -> Self {
        let mut next = self.clone();
        next.skills.insert(skill.into(), level);
        next
    }

    /// Returns a manager holding the items a craft produced.
    #[must_use]
    pub fn with_produced(&self, result: &CraftingResult) -> Self {
        let mut next = self.clone();
        for item in &result.produced_items {
            if item.quantity > 0 {
                let entry = next.materials.entry(item.item_id.clone()).or_insert(0);
                *entry = entry.saturating_add(item.quantity);
            }
        }
        next
    }

    /// Checks a recipe against the current pools.
    ///
    /// Unknown recipes yield an all-false, zeroed report.
    #[must_use]
    pub fn check_can_craft(&self, recipe_id: &str) -> CraftingCheckResult {
        self.check_can_craft_with(recipe_id, &CraftModifiers::default())
    }

    /// Checks a recipe with caller-supplied proficiency and quality bonuses.
    #[must_use]
    pub fn check_can_craft_with(
        &self,
        recipe_id: &str,
        modifiers: &CraftModifiers,
    ) -> CraftingCheckResult {
        let Some(recipe) = self.recipes.get(recipe_id) else {
            return CraftingCheckResult::default();
        };

        let mut check = recipe.can_craft_with_qualities(
            &self.materials,
            &self.tools,
            &self.skills,
            &self.tool_qualities,
        );
        check.estimated_time = modifiers.apply_time(check.estimated_time);
        check.success_probability = modifiers.apply_success(check.success_probability);
        check
    }

    /// Learned recipes that can be crafted right now, sorted by id.
    #[must_use]
    pub fn craftable_recipes(&self) -> Vec<&Recipe> {
        let mut craftable: Vec<&Recipe> = self
            .learned
            .iter()
            .filter_map(|id| self.recipes.get(id))
            .filter(|r| self.check_can_craft(r.id.as_str()).can_craft)
            .collect();
        craftable.sort_by(|a, b| a.id.cmp(&b.id));
        craftable
    }

    /// Attempts one craft without bonuses.
    pub fn craft<R: RandomSource + ?Sized>(
        &self,
        recipe_id: &str,
        rng: &mut R,
    ) -> (Self, CraftingResult) {
        self.craft_with(recipe_id, &CraftModifiers::default(), rng)
    }

    /// Attempts one craft with caller-supplied bonuses.
    ///
    /// Returns the next manager and what happened. On rejection the returned
    /// manager equals `self`.
    pub fn craft_with<R: RandomSource + ?Sized>(
        &self,
        recipe_id: &str,
        modifiers: &CraftModifiers,
        rng: &mut R,
    ) -> (Self, CraftingResult) {
        let Some(recipe) = self.recipes.get(recipe_id) else {
            tracing::trace!(recipe = recipe_id, "craft rejected: unknown recipe");
            return (
                self.clone(),
                CraftingResult::rejected(RecipeId::new(recipe_id), CraftOutcome::UnknownRecipe),
            );
        };

        let check = self.check_can_craft_with(recipe_id, modifiers);
        if !check.can_craft {
            tracing::trace!(
                recipe = recipe_id,
                missing_materials = check.missing_materials.len(),
                missing_tools = check.missing_tools.len(),
                insufficient_skills = check.insufficient_skills.len(),
                "craft rejected: requirements not met"
            );
            return (
                self.clone(),
                CraftingResult::rejected(recipe.id.clone(), CraftOutcome::RequirementsNotMet),
            );
        }

        let success = rng.chance(check.success_probability);
        let (next, result) = if success {
            self.apply_success(recipe, check.estimated_time, rng)
        } else {
            self.apply_failure(recipe, check.estimated_time)
        };

        tracing::debug!(
            recipe = recipe_id,
            success,
            probability = check.success_probability,
            time = result.time_spent,
            "craft attempt resolved"
        );
        (next, result)
    }

    /// Crafts each request line `count` times in order.
    ///
    /// Later attempts see the pools left by earlier ones; nothing is rolled
    /// back when an attempt fails.
    pub fn craft_multiple<R: RandomSource + ?Sized>(
        &self,
        requests: &[CraftRequest],
        rng: &mut R,
    ) -> (Self, Vec<CraftingResult>) {
        let total = requests.iter().map(|r| r.count as usize).sum();
        let mut results = Vec::with_capacity(total);
        let mut manager = self.clone();

        for request in requests {
            for _ in 0..request.count {
                let (next, result) = manager.craft(request.recipe_id.as_str(), rng);
                manager = next;
                results.push(result);
            }
        }

        (manager, results)
    }

    /// Batch sizing for a recipe given the character's skills and an
    /// optional proficiency.
    ///
    /// The proficiency only counts if it applies to the recipe. Returns
    /// `None` for unknown recipes.
    #[must_use]
    pub fn optimal_batch(
        &self,
        recipe_id: &str,
        proficiency: Option<&Proficiency>,
        max_batch_limit: Option<u32>,
    ) -> Option<BatchOptimizationResult> {
        let recipe = self.recipes.get(recipe_id)?;
        let proficiency = proficiency.filter(|p| p.applies_to(recipe));

        let skill_level = recipe
            .skills
            .iter()
            .map(|s| self.skill_level(s.skill_id.as_str()))
            .max()
            .unwrap_or(0);

        let params = BatchOptimizationParams {
            base_batch_size: recipe
                .batch_size
                .saturating_add(proficiency.map_or(0, Proficiency::batch_size_modifier)),
            skill_level,
            proficiency_level: proficiency.map_or(0, Proficiency::level),
            difficulty_multiplier: 1.0 + f64::from(recipe.difficulty) / DIFFICULTY_BATCH_SCALE,
            max_batch_limit,
        };
        Some(BatchOptimizer::calculate_optimal_batch(&params))
    }

    /// In-memory snapshot.
    #[must_use]
    pub fn to_state(&self) -> CraftingState {
        let mut recipes: Vec<Recipe> = self.recipes.values().cloned().collect();
        recipes.sort_by(|a, b| a.id.cmp(&b.id));

        CraftingState {
            recipes,
            learned_recipes: self.learned.iter().cloned().collect(),
            available_materials: self
                .materials
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            available_tools: self.tools.iter().cloned().collect(),
            tool_qualities: self
                .tool_qualities
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            skill_levels: self.skills.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            config: self.config,
        }
    }

    /// Rebuilds a manager from a snapshot.
    ///
    /// Zero material counts are dropped. The learned set is restored as
    /// saved, without re-seeding autolearn recipes.
    #[must_use]
    pub fn from_state(state: CraftingState) -> Self {
        let recipes = state
            .recipes
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        Self {
            recipes: Arc::new(recipes),
            learned: state.learned_recipes.into_iter().collect(),
            materials: state
                .available_materials
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .collect(),
            tools: state.available_tools.into_iter().collect(),
            tool_qualities: state.tool_qualities.into_iter().collect(),
            skills: state.skill_levels.into_iter().collect(),
            config: state.config,
        }
    }

    /// Serializes the manager to JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json(&self) -> AnvilResult<String> {
        Ok(serde_json::to_string(&self.to_state())?)
    }

    /// Restores a manager from JSON, validating every recipe.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed text, `InvalidRecipe` or `InvalidConfig`
    /// for bad content.
    pub fn from_json(content: &str) -> AnvilResult<Self> {
        let state: CraftingState = serde_json::from_str(content)?;
        for recipe in &state.recipes {
            recipe.validate()?;
        }
        state.config.validate()?;
        Ok(Self::from_state(state))
    }

    fn take_material(&mut self, item: &ItemId, count: u32) -> u32 {
        let Some(held) = self.materials.get_mut(item) else {
            return 0;
        };
        let taken = count.min(*held);
        *held -= taken;
        if *held == 0 {
            self.materials.remove(item);
        }
        taken
    }

    fn drop_tool(&mut self, tool: &str) {
        self.tools.remove(tool);
        self.tool_qualities.remove(tool);
    }

    /// Materials to consume, allocated against the pre-craft pool the same
    /// way the requirement check allocates them.
    fn resolved_materials(&self, recipe: &Recipe) -> Vec<(ItemId, u32)> {
        recipe
            .allocate_materials(&self.materials)
            .into_iter()
            .zip(&recipe.materials)
            .map(|(chosen, m)| (chosen.unwrap_or_else(|| m.item_id.clone()), m.count))
            .collect()
    }

    fn apply_failure(&self, recipe: &Recipe, estimated_time: f64) -> (Self, CraftingResult) {
        let mut next = self.clone();
        let mut consumed = Vec::new();

        for (item, required) in self.resolved_materials(recipe) {
            let lost = (f64::from(required) * self.config.failure_material_ratio).ceil() as u32;
            let taken = next.take_material(&item, lost.min(required));
            if taken > 0 {
                consumed.push(RecipeItem::new(item, taken));
            }
        }

        let result = CraftingResult {
            consumed_materials: consumed,
            experience_gained: recipe
                .calculate_experience_gain_with(false, &self.config.experience),
            time_spent: estimated_time * self.config.failure_time_ratio,
            ..CraftingResult::rejected(recipe.id.clone(), CraftOutcome::Failed)
        };
        (next, result)
    }

    fn apply_success<R: RandomSource + ?Sized>(
        &self,
        recipe: &Recipe,
        estimated_time: f64,
        rng: &mut R,
    ) -> (Self, CraftingResult) {
        let mut next = self.clone();

        let mut consumed_materials = Vec::new();
        for (item, required) in self.resolved_materials(recipe) {
            let taken = next.take_material(&item, required);
            if taken > 0 {
                consumed_materials.push(RecipeItem::new(item, taken));
            }
        }

        let mut consumed_tools = Vec::new();
        for tool in recipe.tools.iter().filter(|t| t.consume) {
            if next.tools.contains(&tool.tool_id) {
                next.drop_tool(tool.tool_id.as_str());
                consumed_tools.push(tool.tool_id.clone());
            }
        }

        let skill_surplus = recipe.best_skill_surplus(&self.skills);
        let mut produced_items = Vec::new();
        for output in &recipe.results {
            let quantity = self.roll_quantity(output, skill_surplus, rng);
            if quantity > 0 {
                produced_items.push(RecipeItem::new(output.item_id.clone(), quantity));
            }
            produced_items.extend(output.byproducts.iter().filter(|b| b.quantity > 0).cloned());
        }

        let result = CraftingResult {
            recipe_id: recipe.id.clone(),
            outcome: CraftOutcome::Crafted,
            success: true,
            produced_items,
            consumed_materials,
            consumed_tools,
            experience_gained: recipe.calculate_experience_gain_with(true, &self.config.experience),
            time_spent: estimated_time,
        };
        (next, result)
    }

    fn roll_quantity<R: RandomSource + ?Sized>(
        &self,
        output: &RecipeOutput,
        skill_surplus: u32,
        rng: &mut R,
    ) -> u32 {
        match output.kind {
            QuantityKind::Fixed => output.quantity,
            QuantityKind::Random if output.quantity == 0 => 0,
            QuantityKind::Random => rng.next_in_range(1, output.quantity),
            QuantityKind::SkillBased => {
                let bonus = (skill_surplus / self.config.skill_bonus_divisor.max(1)).min(output.quantity);
                output.quantity + bonus
            }
        }
    }
}
