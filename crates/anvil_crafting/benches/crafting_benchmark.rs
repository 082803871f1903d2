//! Benchmark for crafting engine performance.
//!
//! Run with: cargo bench --package anvil_crafting --bench crafting_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use anvil_crafting::{
    seeded, CraftingManager, MaterialRequirement, QualityData, QualityManager, QualityRequirement,
    Recipe, RecipeCategory, RecipeOutput, SkillRequirement, ToolRequirement,
};

fn create_test_manager() -> CraftingManager {
    // 100 recipes with varying complexity
    let recipes = (0..100u32)
        .map(|i| {
            Recipe::new(format!("recipe_{i}"), format!("Recipe {i}"), RecipeCategory::Material)
                .unwrap()
                .with_material(MaterialRequirement::new(format!("mat_{}", i * 10), (i % 5) + 1))
                .with_material(MaterialRequirement::new(format!("mat_{}", i * 10 + 1), (i % 3) + 1))
                .with_tool(ToolRequirement::new(format!("tool_{}", i % 4)))
                .with_skill(SkillRequirement::new("fabrication", i % 5))
                .with_result(RecipeOutput::new(format!("product_{i}"), 1))
                .with_difficulty(i % 10)
        })
        .collect();

    let mut manager = CraftingManager::create(recipes).set_skill_level("fabrication", 4);
    for t in 0..4 {
        manager = manager.add_tool(format!("tool_{t}"));
    }
    for i in 0..100u32 {
        manager = manager
            .add_material(format!("mat_{}", i * 10), 100)
            .add_material(format!("mat_{}", i * 10 + 1), 100);
    }
    manager
}

fn benchmark_check_can_craft(c: &mut Criterion) {
    let manager = create_test_manager();
    let ids: Vec<String> = (0..100).map(|i| format!("recipe_{i}")).collect();

    c.bench_function("check_can_craft", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % ids.len();
            black_box(manager.check_can_craft(&ids[i]))
        });
    });
}

fn benchmark_craft(c: &mut Criterion) {
    let manager = create_test_manager();
    let mut rng = seeded(7);

    c.bench_function("craft_copy_on_write", |b| {
        b.iter(|| black_box(manager.craft("recipe_0", &mut rng)));
    });
}

fn benchmark_best_quality_match(c: &mut Criterion) {
    let candidates: Vec<Vec<QualityData>> = (0..50u8)
        .map(|i| {
            vec![
                QualityData::new("CUT", i % 6),
                QualityData::new("HAMMER", (i / 2) % 6),
                QualityData::new("SAW", (i / 3) % 6),
            ]
        })
        .collect();
    let requirements = vec![
        QualityRequirement::required("CUT", 2),
        QualityRequirement::required("HAMMER", 1),
        QualityRequirement::optional("SAW", 3),
    ];

    c.bench_function("find_best_quality_match_50_tools", |b| {
        b.iter(|| {
            black_box(QualityManager::find_best_quality_match(
                black_box(&candidates),
                black_box(&requirements),
            ))
        });
    });
}

criterion_group!(
    benches,
    benchmark_check_can_craft,
    benchmark_craft,
    benchmark_best_quality_match
);
criterion_main!(benches);
