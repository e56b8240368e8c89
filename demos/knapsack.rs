// Example: 0/1 knapsack declared through groups and solved with HiGHS
//
// A hiker has a knapsack with capacity of 15 kg.
// There are 5 items to choose from:
//
// Item   | Weight (kg) | Value ($)
// -------|-------------|----------
// Tent   |     7       |   150
// Stove  |     3       |    90
// Food   |     4       |   120
// Water  |     5       |   100
// Camera |     2       |    80
//
// Decision variables: Take-/-<item> in {0, 1}
// Weights and values live in constant groups, the capacity constraint and
// the objective are generated during initialization.
//
// Run with: cargo run --example knapsack --features highs

use lpapi::group::{initializer, NameGenerator, PrefixNameGenerator, SetContainmentValidator};
use lpapi::{
    prefixes, HighsBackend, JsonFileConfig, JsonFileExporter, Model, ModelExporter,
    ObjectiveType, Operator, SolverConfig, VarType,
};
use std::sync::Arc;

const ITEMS: [(&str, f64, f64); 5] = [
    ("Tent", 7.0, 150.0),
    ("Stove", 3.0, 90.0),
    ("Food", 4.0, 120.0),
    ("Water", 5.0, 100.0),
    ("Camera", 2.0, 80.0),
];
const CAPACITY: f64 = 15.0;

fn item_names(prefix: &str) -> Result<Arc<PrefixNameGenerator>, Box<dyn std::error::Error>> {
    let names = ITEMS.iter().map(|(name, _, _)| *name);
    Ok(Arc::new(
        PrefixNameGenerator::new(prefix, 1).with_validator(SetContainmentValidator::new(0, names))?,
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== 0/1 Knapsack ===\n");

    let backend = HighsBackend::with_config(SolverConfig::default().with_time_limit(10.0));
    let mut model = Model::new("Knapsack", backend);

    let take = item_names("Take")?;
    let weights = item_names("Weight")?;
    let values = item_names("Value")?;

    model.create_var_group_with(
        "Take",
        "1 when the item goes in the knapsack",
        Some(take.clone()),
        Some(initializer(|ctx| {
            for (item, _, _) in ITEMS {
                let name = ctx.name(&prefixes![item])?;
                ctx.model()
                    .create_var_in(&name, VarType::Boolean, 0.0, 1.0, ctx.group())?;
            }
            Ok(())
        })),
    )?;

    model.create_constant_group_with(
        "Weights",
        "item weights in kg",
        Some(weights.clone()),
        Some(initializer(|ctx| {
            for (item, weight, _) in ITEMS {
                let name = ctx.name(&prefixes![item])?;
                ctx.model().create_constant_in(&name, weight, ctx.group())?;
            }
            Ok(())
        })),
    )?;

    model.create_constant_group_with(
        "Values",
        "item values in $",
        Some(values.clone()),
        Some(initializer(|ctx| {
            for (item, _, value) in ITEMS {
                let name = ctx.name(&prefixes![item])?;
                ctx.model().create_constant_in(&name, value, ctx.group())?;
            }
            Ok(())
        })),
    )?;

    let capacity_take = take.clone();
    model.create_constraint_group_with(
        "Capacity",
        "weight limit",
        None,
        Some(initializer(move |ctx| {
            let model = ctx.model();
            let mut load = model.expression();
            for (item, _, _) in ITEMS {
                let weight = model.constant(&weights.name(&prefixes![item])?)?;
                let var = model.var(&capacity_take.name(&prefixes![item])?)?;
                load.add_scaled_by_constant(&weight, &var)?;
            }
            let mut limit = model.expression();
            limit.add_constant(CAPACITY);
            model.add_constraint_in("WeightLimit", load, Operator::LessEqual, limit, ctx.group())?;
            Ok(())
        })),
    )?;

    model.attach_objective_generator(ObjectiveType::Maximize, move |model| {
        let mut total = model.expression();
        for (item, _, _) in ITEMS {
            let value = model.constant(&values.name(&prefixes![item])?)?;
            let var = model.var(&take.name(&prefixes![item])?)?;
            total.add_scaled_by_constant(&value, &var)?;
        }
        Ok(total)
    })?;

    model.init()?;
    let status = model.compute_model()?;
    println!("Status: {}", status);

    if status.is_optimal() {
        model.extract_results()?;
        println!("Total value: ${:.0}", model.objective_value()?);
        println!("Solve time: {:?}\n", model.computation_time()?);
        println!("Packed items:");
        for (item, weight, value) in ITEMS {
            let id = format!("Take-/-{}", item);
            if model.var_result(&id)?.unwrap_or(0.0) > 0.5 {
                println!("  {:<8} {:>4} kg  ${:>4}", item, weight, value);
            }
        }
    }

    let exporter = JsonFileExporter::new(JsonFileConfig::default());
    exporter.export_model(&model)?;
    println!("\nModel written to {}", JsonFileConfig::default().folder_path.display());

    Ok(())
}
