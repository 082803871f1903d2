//! Integration tests for the crafting engine.

use std::sync::Arc;

use anvil_crafting::{
    seeded, BatchOptimizationParams, BatchOptimizer, CraftOutcome, CraftRequest, CraftingConfig,
    CraftingManager, ItemId, MaterialRequirement, MissingMaterial, Proficiency,
    ProficiencyDefinition, QualityData, QualityManager, QualityRequirement, Recipe,
    RecipeCategory, RecipeHelper, RecipeOutput, ScriptedRandom, SkillLevels, SkillRequirement,
    TimeKind, ToolRequirement,
};
use proptest::prelude::*;

fn campfire_catalog() -> Vec<Recipe> {
    vec![
        Recipe::new("cooked_meat", "Cooked Meat", RecipeCategory::Food)
            .unwrap()
            .with_material(MaterialRequirement::new("meat", 2))
            .with_tool(ToolRequirement::new("fire").heated())
            .with_skill(SkillRequirement::new("cooking", 1))
            .with_result(RecipeOutput::new("cooked_meat", 2))
            .with_time(60.0, TimeKind::Fixed)
            .with_difficulty(1)
            .with_flags(true, true, false)
            .with_related_skill("cooking"),
        Recipe::new("plank", "Plank", RecipeCategory::Material)
            .unwrap()
            .with_material(MaterialRequirement::new("wood", 2))
            .with_result(RecipeOutput::new("plank", 4))
            .with_time(20.0, TimeKind::Fixed),
        Recipe::new("bench", "Bench", RecipeCategory::Other)
            .unwrap()
            .with_material(MaterialRequirement::new("plank", 4))
            .with_material(MaterialRequirement::new("nails", 6))
            .with_tool(ToolRequirement::new("hammer"))
            .with_result(RecipeOutput::new("bench", 1))
            .with_time(300.0, TimeKind::Fixed)
            .with_difficulty(2)
            .with_flags(false, true, true),
    ]
}

#[test]
fn test_missing_wood_is_itemized() {
    let manager = CraftingManager::create(campfire_catalog()).add_material("wood", 1);

    let check = manager.check_can_craft("plank");
    assert!(!check.can_craft);
    assert_eq!(
        check.missing_materials,
        vec![MissingMaterial {
            item_id: ItemId::from("wood"),
            required: 2,
            have: 1,
        }]
    );
}

#[test]
fn test_cooking_session() {
    let manager = CraftingManager::create(campfire_catalog())
        .add_material("meat", 5)
        .add_material("salt", 1)
        .add_tool("fire")
        .set_skill_level("cooking", 2);

    assert!(manager.is_learned("cooked_meat"));
    assert!(!manager.is_learned("plank"));

    let (after, result) = manager.craft("cooked_meat", &mut ScriptedRandom::always_succeed());
    assert_eq!(result.outcome, CraftOutcome::Crafted);
    assert_eq!(after.material_count("meat"), 3);
    assert_eq!(after.material_count("salt"), 1);
    assert!(after.has_tool("fire"));
    assert_eq!(result.produced("cooked_meat"), 2);
    assert_eq!(result.experience_gained["cooking"], 15);

    // produced items go back to the pool only on request
    assert_eq!(after.material_count("cooked_meat"), 0);
    let stocked = after.with_produced(&result);
    assert_eq!(stocked.material_count("cooked_meat"), 2);

    // the snapshot before the craft is untouched
    assert_eq!(manager.material_count("meat"), 5);
}

#[test]
fn test_failed_attempt_loses_half_rounded_up() {
    let manager = CraftingManager::create(campfire_catalog())
        .add_material("meat", 5)
        .add_tool("fire")
        .set_skill_level("cooking", 1);

    let (after, result) = manager.craft("cooked_meat", &mut ScriptedRandom::always_fail());
    assert_eq!(result.outcome, CraftOutcome::Failed);
    assert!(!result.success);
    assert!(result.produced_items.is_empty());
    assert_eq!(after.material_count("meat"), 4);
    assert!((result.time_spent - 30.0).abs() < 1e-9);
}

#[test]
fn test_rejections_leave_state_unchanged() {
    let manager = CraftingManager::create(campfire_catalog()).add_material("wood", 1);
    let mut rng = seeded(1);

    let (after, result) = manager.craft("castle", &mut rng);
    assert_eq!(result.outcome, CraftOutcome::UnknownRecipe);
    assert_eq!(after, manager);

    let (after, result) = manager.craft("plank", &mut rng);
    assert_eq!(result.outcome, CraftOutcome::RequirementsNotMet);
    assert_eq!(after, manager);
    assert!(result.time_spent.abs() < f64::EPSILON);
}

#[test]
fn test_production_chain() {
    let manager = CraftingManager::create(campfire_catalog())
        .learn_recipe("plank")
        .learn_recipe("bench")
        .add_material("wood", 2)
        .add_material("nails", 6)
        .add_tool("hammer");

    let mut rng = ScriptedRandom::always_succeed();
    let (manager, planks) = manager.craft("plank", &mut rng);
    let manager = manager.with_produced(&planks);
    assert_eq!(manager.material_count("plank"), 4);

    let craftable: Vec<&str> = manager.craftable_recipes().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(craftable, vec!["bench"]);

    let (manager, bench) = manager.craft("bench", &mut rng);
    assert!(bench.success);
    assert_eq!(manager.material_count("plank"), 0);
    assert_eq!(manager.material_count("nails"), 0);
    assert!(manager.materials().is_empty());
}

#[test]
fn test_craft_multiple_sees_earlier_consumption() {
    let manager = CraftingManager::create(campfire_catalog()).add_material("wood", 5);
    let requests = [CraftRequest::new("plank", 3)];

    let (after, results) = manager.craft_multiple(&requests, &mut ScriptedRandom::always_succeed());
    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(results[1].success);
    assert_eq!(results[2].outcome, CraftOutcome::RequirementsNotMet);
    assert_eq!(after.material_count("wood"), 1);
}

#[test]
fn test_save_and_restore() {
    let manager = CraftingManager::create(campfire_catalog())
        .with_config(CraftingConfig::from_toml_str("failure_material_ratio = 0.25").unwrap())
        .unwrap()
        .learn_recipe("bench")
        .add_material("nails", 12)
        .add_tool_with_quality("hammer", 3)
        .set_skill_level("carpentry", 4);

    let json = manager.to_json().unwrap();
    let restored = CraftingManager::from_json(&json).unwrap();
    assert_eq!(restored, manager);
    assert!((restored.config().failure_material_ratio - 0.25).abs() < f64::EPSILON);

    assert!(CraftingManager::from_json("{ not json").is_err());
}

#[test]
fn test_proficiency_bonuses_flow_into_batches() {
    let definition = Arc::new(
        ProficiencyDefinition::new("prof_carpentry", "woodworking", 1.0, 10)
            .unwrap()
            .with_related_categories(vec![RecipeCategory::Material]),
    );
    let proficiency = Proficiency::new(definition).unlock().gain_experience(1_000.0);
    // 100 + 200 + 300 + 400
    assert_eq!(proficiency.level(), 4);

    let manager = CraftingManager::create(campfire_catalog());
    let plain = manager.optimal_batch("plank", None, None).unwrap();
    let trained = manager.optimal_batch("plank", Some(&proficiency), None).unwrap();
    assert!(trained.batch_size >= plain.batch_size);
    assert!(manager.optimal_batch("castle", None, None).is_none());
}

#[test]
fn test_quality_tool_selection() {
    let toolbox = vec![
        vec![QualityData::new("CUT", 1)],
        vec![QualityData::new("CUT", 3), QualityData::new("SAW", 1)],
        vec![QualityData::new("CUT", 4)],
    ];
    let requirements = vec![
        QualityRequirement::required("CUT", 2),
        QualityRequirement::optional("SAW", 1),
    ];
    // 2 matched + 0.4 beats 1 matched + 0.4
    assert_eq!(QualityManager::find_best_quality_match(&toolbox, &requirements), Some(1));
    assert_eq!(
        QualityManager::find_best_quality_match(&toolbox[..1], &requirements),
        None
    );
}

#[test]
fn test_helper_over_manager_catalog() {
    let manager = CraftingManager::create(campfire_catalog())
        .add_material("wood", 2)
        .add_material("meat", 1);

    let top = RecipeHelper::recommended_recipes(manager.recipes(), &manager, 1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].recipe_id.as_str(), "plank");

    let groups = RecipeHelper::group_recipes_by_category(manager.recipes());
    assert_eq!(groups.len(), 3);
}

fn material_recipe(count: u32, difficulty: u32) -> Recipe {
    Recipe::new("widget", "Widget", RecipeCategory::Material)
        .unwrap()
        .with_material(MaterialRequirement::new("ore", count))
        .with_result(RecipeOutput::new("widget", 1))
        .with_difficulty(difficulty)
}

proptest! {
    #[test]
    fn prop_batch_size_monotone_in_skill(skill in 0u32..40, extra in 0u32..10, difficulty in 1.0f64..5.0) {
        let low = BatchOptimizer::calculate_optimal_batch(&BatchOptimizationParams {
            skill_level: skill,
            difficulty_multiplier: difficulty,
            ..BatchOptimizationParams::default()
        });
        let high = BatchOptimizer::calculate_optimal_batch(&BatchOptimizationParams {
            skill_level: skill + extra,
            difficulty_multiplier: difficulty,
            ..BatchOptimizationParams::default()
        });
        prop_assert!(high.batch_size >= low.batch_size);
    }

    #[test]
    fn prop_batch_size_antitone_in_difficulty(skill in 0u32..6, difficulty in 1.0f64..5.0, extra in 0.0f64..5.0) {
        let params = BatchOptimizationParams {
            base_batch_size: 5,
            skill_level: skill,
            difficulty_multiplier: difficulty,
            ..BatchOptimizationParams::default()
        };
        let easy = BatchOptimizer::calculate_optimal_batch(&params);
        let hard = BatchOptimizer::calculate_optimal_batch(&BatchOptimizationParams {
            difficulty_multiplier: difficulty + extra,
            ..params
        });
        prop_assert!(hard.batch_size <= easy.batch_size);
    }

    #[test]
    fn prop_material_arithmetic(a in 0u32..1000, b in 0u32..1000, take in 0u32..3000) {
        let manager = CraftingManager::create_default();
        let twice = manager.add_material("ore", a).add_material("ore", b);
        let once = manager.add_material("ore", a + b);
        prop_assert_eq!(twice.material_count("ore"), once.material_count("ore"));

        let removed = once.remove_material("ore", take);
        let left = (a + b).saturating_sub(take);
        prop_assert_eq!(removed.material_count("ore"), left);
        prop_assert_eq!(removed.materials().contains_key("ore"), left > 0);
    }

    #[test]
    fn prop_satisfied_materials_are_craftable(count in 1u32..50, surplus in 0u32..50) {
        let manager = CraftingManager::create(vec![material_recipe(count, 0)])
            .add_material("ore", count + surplus);
        let check = manager.check_can_craft("widget");
        prop_assert!(check.can_craft);
        prop_assert!(check.missing_materials.is_empty());
        prop_assert!((check.success_probability - 1.0).abs() < 1e-9);

        let (after, result) = manager.craft("widget", &mut seeded(u64::from(count)));
        prop_assert!(result.success);
        prop_assert_eq!(after.material_count("ore"), surplus);
    }

    #[test]
    fn prop_success_grows_with_skill(difficulty in 0u32..20, held in 0u32..20, extra in 1u32..10) {
        let recipe = material_recipe(1, difficulty).with_skill(SkillRequirement::new("mining", 2));
        let mut levels = SkillLevels::new();
        levels.insert("mining".into(), held);
        let low = recipe.calculate_success_probability(Some(&levels));
        levels.insert("mining".into(), held + extra);
        let high = recipe.calculate_success_probability(Some(&levels));
        prop_assert!(high > low || low >= 1.0);
        prop_assert!(low > 0.0 && high <= 1.0);
    }

    #[test]
    fn prop_learned_recipes_stay_learned(ops in proptest::collection::vec(0u8..5, 0..20)) {
        let mut manager = CraftingManager::create(campfire_catalog()).learn_recipe("plank");
        let mut rng = seeded(9);
        for op in ops {
            manager = match op {
                0 => manager.add_material("wood", 3),
                1 => manager.remove_material("wood", 2),
                2 => manager.add_tool("hammer").remove_tool("fire"),
                3 => manager.set_skill_level("cooking", 0),
                _ => manager.craft("plank", &mut rng).0,
            };
            prop_assert!(manager.is_learned("plank"));
            prop_assert!(manager.is_learned("cooked_meat"));
        }
    }
}
