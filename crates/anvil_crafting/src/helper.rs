//! # Recipe Queries
//!
//! Read-only helpers for crafting menus: filtering, sorting, duplicate
//! detection, craftability advice and summary statistics. Nothing here
//! changes state.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ids::{ItemId, RecipeId, SkillId};
use crate::manager::CraftingManager;
use crate::recipe::{CraftType, MissingMaterial, Recipe, RecipeCategory};

/// Score lost per missing material.
const MISSING_MATERIAL_PENALTY: f64 = 0.3;
/// Score lost per missing tool.
const MISSING_TOOL_PENALTY: f64 = 0.2;
/// Score lost per missing skill level.
const SKILL_GAP_PENALTY: f64 = 0.1;

/// Filter criteria; unset fields match everything. All set fields must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Exact category.
    pub category: Option<RecipeCategory>,
    /// Exact craft type.
    pub craft_type: Option<CraftType>,
    /// Recipe must require this skill.
    pub skill: Option<SkillId>,
    /// Recipe must require this tool.
    pub tool: Option<ItemId>,
    /// Inclusive lower difficulty bound.
    pub min_difficulty: Option<u32>,
    /// Inclusive upper difficulty bound.
    pub max_difficulty: Option<u32>,
    /// Case-insensitive substring of the name or id.
    pub search: Option<String>,
}

impl RecipeFilter {
    fn matches(&self, recipe: &Recipe, needle: Option<&str>) -> bool {
        self.category.map_or(true, |c| recipe.category == c)
            && self.craft_type.map_or(true, |t| recipe.craft_type == t)
            && self.skill.as_ref().map_or(true, |s| recipe.requires_skill(s))
            && self.tool.as_ref().map_or(true, |t| recipe.requires_tool(t))
            && self.min_difficulty.map_or(true, |min| recipe.difficulty >= min)
            && self.max_difficulty.map_or(true, |max| recipe.difficulty <= max)
            && needle.map_or(true, |n| {
                recipe.name.to_lowercase().contains(n) || recipe.id.as_str().to_lowercase().contains(n)
            })
    }
}

/// Sort field for [`RecipeHelper::sort_recipes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Name, case-insensitive.
    Name,
    /// Category.
    Category,
    /// Difficulty.
    Difficulty,
    /// Base crafting time.
    Time,
    /// Highest skill requirement.
    SkillRequirement,
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// How closely a duplicate matches its primary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateKind {
    /// Same results and same materials.
    Identical,
    /// Same results, different materials.
    SameResults,
}

/// A recipe and the later recipes that produce the same things.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// First-seen recipe, kept by [`RecipeHelper::remove_duplicates`].
    pub primary: RecipeId,
    /// Later recipes with the same result sequence.
    pub duplicates: Vec<(RecipeId, DuplicateKind)>,
}

/// Craftability advice for one recipe.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantAdvice {
    /// The recipe.
    pub recipe_id: RecipeId,
    /// Whether it can be crafted right now.
    pub can_craft: bool,
    /// Score in `[0, 1]`; 1 means nothing is missing.
    pub craftability: f64,
    /// Short materials.
    pub missing_materials: Vec<MissingMaterial>,
    /// Absent tools.
    pub missing_tools: Vec<ItemId>,
    /// Total skill levels short.
    pub skill_gap: u32,
    /// Time estimate.
    pub estimated_time: f64,
    /// Success estimate.
    pub success_probability: f64,
}

/// Summary counts over a recipe collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecipeStatistics {
    /// Number of recipes.
    pub total: usize,
    /// Recipes per category.
    pub by_category: BTreeMap<RecipeCategory, usize>,
    /// Recipes the manager has learned.
    pub learned: usize,
    /// Learned recipes craftable right now.
    pub craftable: usize,
    /// Autolearn recipes.
    pub autolearn: usize,
    /// Reversible recipes.
    pub reversible: usize,
    /// Mean difficulty, 0 when empty.
    pub average_difficulty: f64,
    /// Mean base time, 0 when empty.
    pub average_time: f64,
}

/// Query functions over recipe collections.
pub struct RecipeHelper;

impl RecipeHelper {
    /// Recipes matching every set criterion, in input order.
    #[must_use]
    pub fn filter_recipes<'a, I>(recipes: I, filter: &RecipeFilter) -> Vec<&'a Recipe>
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        recipes
            .into_iter()
            .filter(|r| filter.matches(r, needle.as_deref()))
            .collect()
    }

    /// Sorts by `key`, ties broken by id so the order is stable.
    #[must_use]
    pub fn sort_recipes<'a>(
        mut recipes: Vec<&'a Recipe>,
        key: SortKey,
        order: SortOrder,
    ) -> Vec<&'a Recipe> {
        recipes.sort_by(|a, b| {
            let primary = match key {
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortKey::Category => a.category.cmp(&b.category),
                SortKey::Difficulty => a.difficulty.cmp(&b.difficulty),
                SortKey::Time => a
                    .time
                    .base_time
                    .partial_cmp(&b.time.base_time)
                    .unwrap_or(Ordering::Equal),
                SortKey::SkillRequirement => a.max_skill_requirement().cmp(&b.max_skill_requirement()),
            };
            let primary = match order {
                SortOrder::Ascending => primary,
                SortOrder::Descending => primary.reverse(),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });
        recipes
    }

    /// Groups recipes that produce the same item sequence.
    ///
    /// Only groups with at least one duplicate are returned, ordered by the
    /// position of their primary. Recipes without results are never grouped.
    #[must_use]
    pub fn detect_duplicates<'a, I>(recipes: I) -> Vec<DuplicateGroup>
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let mut primaries: Vec<&Recipe> = Vec::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut by_results: HashMap<Vec<&ItemId>, usize> = HashMap::new();

        for recipe in recipes {
            if recipe.results.is_empty() {
                continue;
            }
            let key: Vec<&ItemId> = recipe.results.iter().map(|r| &r.item_id).collect();
            match by_results.get(&key) {
                Some(&index) => {
                    let kind = if primaries[index].materials == recipe.materials {
                        DuplicateKind::Identical
                    } else {
                        DuplicateKind::SameResults
                    };
                    groups[index].duplicates.push((recipe.id.clone(), kind));
                }
                None => {
                    by_results.insert(key, groups.len());
                    primaries.push(recipe);
                    groups.push(DuplicateGroup {
                        primary: recipe.id.clone(),
                        duplicates: Vec::new(),
                    });
                }
            }
        }

        groups.retain(|g| !g.duplicates.is_empty());
        groups
    }

    /// Keeps the first recipe of every result sequence.
    #[must_use]
    pub fn remove_duplicates<'a, I>(recipes: I) -> Vec<&'a Recipe>
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let mut seen: HashSet<Vec<&ItemId>> = HashSet::new();
        recipes
            .into_iter()
            .filter(|recipe| {
                recipe.results.is_empty()
                    || seen.insert(recipe.results.iter().map(|r| &r.item_id).collect())
            })
            .collect()
    }

    /// Explains how far the manager's pools are from crafting `recipe`.
    #[must_use]
    pub fn assistant_advice(recipe: &Recipe, manager: &CraftingManager) -> AssistantAdvice {
        let check = recipe.can_craft_with_qualities(
            manager.materials(),
            manager.tools(),
            manager.skill_levels(),
            manager.tool_qualities(),
        );
        let skill_gap = check.skill_gap();
        let craftability = (1.0
            - MISSING_MATERIAL_PENALTY * check.missing_materials.len() as f64
            - MISSING_TOOL_PENALTY * check.missing_tools.len() as f64
            - SKILL_GAP_PENALTY * f64::from(skill_gap))
        .clamp(0.0, 1.0);

        AssistantAdvice {
            recipe_id: recipe.id.clone(),
            can_craft: check.can_craft,
            craftability,
            missing_materials: check.missing_materials,
            missing_tools: check.missing_tools,
            skill_gap,
            estimated_time: check.estimated_time,
            success_probability: check.success_probability,
        }
    }

    /// The `limit` most craftable recipes, best first; ties broken by id.
    #[must_use]
    pub fn recommended_recipes<'a, I>(
        recipes: I,
        manager: &CraftingManager,
        limit: usize,
    ) -> Vec<AssistantAdvice>
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let mut advice: Vec<AssistantAdvice> = recipes
            .into_iter()
            .map(|r| Self::assistant_advice(r, manager))
            .collect();
        advice.sort_by(|a, b| {
            b.craftability
                .partial_cmp(&a.craftability)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.recipe_id.cmp(&b.recipe_id))
        });
        advice.truncate(limit);
        advice
    }

    /// Recipes bucketed by category, each bucket in input order.
    #[must_use]
    pub fn group_recipes_by_category<'a, I>(recipes: I) -> BTreeMap<RecipeCategory, Vec<&'a Recipe>>
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let mut groups: BTreeMap<RecipeCategory, Vec<&'a Recipe>> = BTreeMap::new();
        for recipe in recipes {
            groups.entry(recipe.category).or_default().push(recipe);
        }
        groups
    }

    /// Counts and averages over `recipes`, with learned/craftable counts
    /// taken from `manager`.
    #[must_use]
    pub fn recipe_statistics<'a, I>(recipes: I, manager: &CraftingManager) -> RecipeStatistics
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        let mut stats = RecipeStatistics::default();
        let mut difficulty_sum = 0.0;
        let mut time_sum = 0.0;

        for recipe in recipes {
            stats.total += 1;
            *stats.by_category.entry(recipe.category).or_insert(0) += 1;
            if recipe.is_auto_learn() {
                stats.autolearn += 1;
            }
            if recipe.is_reversible() {
                stats.reversible += 1;
            }
            if manager.is_learned(recipe.id.as_str()) {
                stats.learned += 1;
                let check = recipe.can_craft_with_qualities(
                    manager.materials(),
                    manager.tools(),
                    manager.skill_levels(),
                    manager.tool_qualities(),
                );
                if check.can_craft {
                    stats.craftable += 1;
                }
            }
            difficulty_sum += f64::from(recipe.difficulty);
            time_sum += recipe.time.base_time;
        }

        if stats.total > 0 {
            stats.average_difficulty = difficulty_sum / stats.total as f64;
            stats.average_time = time_sum / stats.total as f64;
        }
        stats
    }
}
