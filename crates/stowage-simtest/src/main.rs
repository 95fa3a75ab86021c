//! Stowage Headless Loading Harness
//!
//! Runs scripted depot-to-vehicle loading scenarios against the pure
//! loading logic and reports pass/fail per check. Runs entirely
//! in-process: no engine, no networking, no rendering.
//!
//! Usage:
//!   cargo run -p stowage-simtest
//!   cargo run -p stowage-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p stowage-simtest

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use stowage_logic::effort::{
    background_effort, crew_effort, worker_effort, EffortConfig, WorkerAttributes,
};
use stowage_logic::equipment::EquipmentFactory;
use stowage_logic::loading::{LoadingConfig, LoadingController};
use stowage_logic::manifest::{Manifest, ManifestBuilder};
use stowage_logic::resources::{ResourceCatalog, ResourceId};
use stowage_logic::store::Store;

// ── Scenario data (same catalog the library ships built in) ─────────────
const CATALOG_JSON: &str = include_str!("../../../data/resource_catalog.json");
const SCENARIOS_JSON: &str = include_str!("../../../data/loading_scenarios.json");

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    effort: EffortSource,
    max_calls: u32,
    #[serde(default)]
    config: LoadingConfig,
    depot: StoreSpec,
    rover: StoreSpec,
    manifest: ManifestSpec,
    #[serde(default)]
    replenish: Vec<Replenish>,
    #[serde(default)]
    seed: u64,
    expect: Expectation,
    expect_calls_at_most: Option<u32>,
}

/// Where each call's effort budget comes from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EffortSource {
    Fixed(f64),
    /// Elapsed time units of ambient labor.
    Background(f64),
    Crew {
        workers: Vec<WorkerAttributes>,
        elapsed: f64,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreSpec {
    capacity: BTreeMap<String, f64>,
    amounts: BTreeMap<String, f64>,
    items: BTreeMap<String, u32>,
    equipment: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestSpec {
    required_amounts: BTreeMap<String, f64>,
    optional_amounts: BTreeMap<String, f64>,
    required_units: BTreeMap<String, u32>,
    optional_units: BTreeMap<String, u32>,
}

/// Depot production between calls.
#[derive(Debug, Deserialize)]
struct Replenish {
    resource: String,
    amount: f64,
    probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Expectation {
    Completed,
    Failed,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Stowage Loading Harness ===\n");

    let mut results = Vec::new();

    // 1. Catalog data
    let catalog = match validate_catalog(&mut results) {
        Some(c) => Arc::new(c),
        None => {
            report(&results, verbose);
            std::process::exit(1);
        }
    };

    // 2. Store ledger rules
    results.extend(validate_store_rules(&catalog));

    // 3. Effort model sweep
    results.extend(validate_effort_model());

    // 4. Scripted loading scenarios
    results.extend(validate_scenarios(&catalog, verbose));

    if !report(&results, verbose) {
        std::process::exit(1);
    }
}

/// Print results; returns whether everything passed.
fn report(results: &[TestResult], verbose: bool) -> bool {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
    failed == 0
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(results: &mut Vec<TestResult>) -> Option<ResourceCatalog> {
    println!("--- Resource Catalog ---");
    let catalog = match ResourceCatalog::from_json(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };

    results.push(TestResult {
        name: "catalog_parse".into(),
        passed: true,
        detail: format!("{} resources loaded", catalog.len()),
    });
    results.push(TestResult {
        name: "catalog_matches_builtin".into(),
        passed: catalog == ResourceCatalog::standard(),
        detail: "data file and built-in catalog agree".into(),
    });
    Some(catalog)
}

// ── 2. Store rules ──────────────────────────────────────────────────────

fn validate_store_rules(catalog: &Arc<ResourceCatalog>) -> Vec<TestResult> {
    println!("--- Store Ledger ---");
    let mut results = Vec::new();
    let water = catalog.find_by_name("water").map(|s| s.id);
    let Some(water) = water else {
        results.push(TestResult {
            name: "store_water_present".into(),
            passed: false,
            detail: "catalog has no water".into(),
        });
        return results;
    };

    let mut tank = Store::new("tank", catalog.clone());
    let steps: Result<(f64, f64, f64, f64), String> = (|| {
        tank.set_capacity(water, 200.0).map_err(|e| e.to_string())?;
        let a = tank.store_amount(water, 100.0).map_err(|e| e.to_string())?;
        let b = tank.store_amount(water, 150.0).map_err(|e| e.to_string())?;
        let full = tank.stored_amount(water);
        let c = tank.retrieve_amount(water, 250.0).map_err(|e| e.to_string())?;
        Ok((a, b, full, c))
    })();

    results.push(match steps {
        Ok((a, b, full, c)) => TestResult {
            name: "store_clamps_and_reports".into(),
            passed: a == 0.0 && b == 50.0 && full == 200.0 && c == 50.0,
            detail: format!(
                "excess {a}, excess {b}, full at {full}, shortfall {c}, left {}",
                tank.stored_amount(water)
            ),
        },
        Err(e) => TestResult {
            name: "store_clamps_and_reports".into(),
            passed: false,
            detail: e,
        },
    });

    let mut bare = Store::new("bare", catalog.clone());
    let excess = bare.store_amount(water, 12.0);
    results.push(TestResult {
        name: "store_unsupported_is_excess".into(),
        passed: excess == Ok(12.0),
        detail: format!("{excess:?}"),
    });

    let negative = bare.store_amount(water, -1.0);
    results.push(TestResult {
        name: "store_negative_is_fault".into(),
        passed: negative.is_err(),
        detail: format!("{negative:?}"),
    });

    results
}

// ── 3. Effort model ─────────────────────────────────────────────────────

fn validate_effort_model() -> Vec<TestResult> {
    println!("--- Effort Model ---");
    let config = EffortConfig::default();
    let mut results = Vec::new();

    let mut last = -1.0;
    let mut monotonic = true;
    for strength in (0..=100).step_by(10) {
        let worker = WorkerAttributes {
            strength: strength as f64,
            ..Default::default()
        };
        let e = worker_effort(&worker, 1.0, &config);
        if e < last {
            monotonic = false;
        }
        last = e;
    }
    results.push(TestResult {
        name: "effort_monotonic_in_strength".into(),
        passed: monotonic,
        detail: format!("strongest worker: {last:.2} per time unit"),
    });

    let mut non_negative = true;
    for fatigue in [0.0, 0.5, 1.0, 2.0, f64::NAN] {
        for elapsed in [0.0, 0.5, 10.0, -1.0] {
            let worker = WorkerAttributes {
                fatigue,
                ..Default::default()
            };
            let e = worker_effort(&worker, elapsed, &config);
            if !(e.is_finite() && e >= 0.0) {
                non_negative = false;
            }
        }
    }
    results.push(TestResult {
        name: "effort_never_negative".into(),
        passed: non_negative,
        detail: "all fatigue/elapsed combinations give finite budgets".into(),
    });

    let bg = background_effort(1.0, &config);
    results.push(TestResult {
        name: "effort_background_positive".into(),
        passed: bg > 0.0,
        detail: format!("{bg:.2} per time unit"),
    });

    results
}

// ── 4. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(catalog: &Arc<ResourceCatalog>, verbose: bool) -> Vec<TestResult> {
    println!("--- Loading Scenarios ---");
    let scenarios: Vec<Scenario> = match serde_json::from_str(SCENARIOS_JSON) {
        Ok(s) => s,
        Err(e) => {
            return vec![TestResult {
                name: "scenarios_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            }];
        }
    };

    scenarios
        .iter()
        .map(|s| match run_scenario(catalog, s, verbose) {
            Ok(r) => r,
            Err(e) => TestResult {
                name: format!("scenario_{}", s.name),
                passed: false,
                detail: format!("setup error: {e}"),
            },
        })
        .collect()
}

fn run_scenario(
    catalog: &Arc<ResourceCatalog>,
    scenario: &Scenario,
    verbose: bool,
) -> Result<TestResult, String> {
    let mut factory = EquipmentFactory::starting_at(1);
    let mut depot = build_store("depot", &scenario.depot, catalog, &mut factory)?;
    let mut rover = build_store("rover", &scenario.rover, catalog, &mut factory)?;
    let manifest = build_manifest(&scenario.manifest, catalog)?;
    let replenish = scenario
        .replenish
        .iter()
        .map(|r| resolve(catalog, &r.resource).map(|id| (id, r)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut controller =
        LoadingController::with_config(&depot, &rover, manifest, scenario.config.clone())
            .map_err(|e| e.to_string())?;
    let effort_config = EffortConfig::default();
    let mut rng = StdRng::seed_from_u64(scenario.seed);

    let mut calls = 0;
    while calls < scenario.max_calls && !controller.status().is_terminal() {
        for (id, r) in &replenish {
            if rng.gen_bool(r.probability.clamp(0.0, 1.0)) {
                depot.store_amount(*id, r.amount).map_err(|e| e.to_string())?;
            }
        }
        calls += 1;
        let result = match &scenario.effort {
            EffortSource::Fixed(budget) => controller.load(&mut depot, &mut rover, *budget),
            EffortSource::Background(elapsed) => controller.background_load(
                &mut depot,
                &mut rover,
                background_effort(*elapsed, &effort_config),
            ),
            EffortSource::Crew { workers, elapsed } => controller.load(
                &mut depot,
                &mut rover,
                crew_effort(workers, *elapsed, &effort_config),
            ),
        };
        result.map_err(|e| e.to_string())?;
        if verbose {
            log::debug!("{}: {}", scenario.name, controller.progress(&rover));
        }
    }

    let reached = match (controller.is_completed(), controller.is_failure()) {
        (true, _) => Some(Expectation::Completed),
        (_, true) => Some(Expectation::Failed),
        _ => None,
    };
    let within_calls = scenario.expect_calls_at_most.map_or(true, |max| calls <= max);
    let manifest_met = match scenario.expect {
        Expectation::Completed => controller.manifest().is_satisfied_by(&rover),
        Expectation::Failed => true,
    };

    Ok(TestResult {
        name: format!("scenario_{}", scenario.name),
        passed: reached == Some(scenario.expect) && within_calls && manifest_met,
        detail: format!(
            "{} (rover {:.1} kg in {} resources, {} equipment; depot {:.1} kg)",
            controller.progress(&rover),
            rover.stored_mass(),
            rover.supported_resources().count(),
            rover.all_equipment().count(),
            depot.stored_mass()
        ),
    })
}

fn resolve(catalog: &ResourceCatalog, name: &str) -> Result<ResourceId, String> {
    catalog
        .find_by_name(name)
        .map(|s| s.id)
        .ok_or_else(|| format!("unknown resource '{name}'"))
}

fn build_store(
    owner: &str,
    spec: &StoreSpec,
    catalog: &Arc<ResourceCatalog>,
    factory: &mut EquipmentFactory,
) -> Result<Store, String> {
    let mut store = Store::new(owner, catalog.clone());
    for (name, limit) in &spec.capacity {
        store
            .set_capacity(resolve(catalog, name)?, *limit)
            .map_err(|e| e.to_string())?;
    }
    for (name, kg) in &spec.amounts {
        let excess = store
            .store_amount(resolve(catalog, name)?, *kg)
            .map_err(|e| e.to_string())?;
        if excess > 0.0 {
            return Err(format!("{owner} cannot hold {kg} kg of {name}"));
        }
    }
    for (name, count) in &spec.items {
        let excess = store
            .store_items(resolve(catalog, name)?, *count)
            .map_err(|e| e.to_string())?;
        if excess > 0 {
            return Err(format!("{owner} cannot hold {count} {name}"));
        }
    }
    for (name, count) in &spec.equipment {
        let kind = resolve(catalog, name)?;
        for item in factory.make_many(kind, *count) {
            if store
                .store_equipment(item)
                .map_err(|e| e.to_string())?
                .is_some()
            {
                return Err(format!("{owner} cannot hold {count} {name}"));
            }
        }
    }
    Ok(store)
}

fn build_manifest(spec: &ManifestSpec, catalog: &Arc<ResourceCatalog>) -> Result<Manifest, String> {
    let mut builder = ManifestBuilder::new(catalog.clone());
    for (name, kg) in &spec.required_amounts {
        builder = builder.require_amount(resolve(catalog, name)?, *kg);
    }
    for (name, kg) in &spec.optional_amounts {
        builder = builder.optional_amount(resolve(catalog, name)?, *kg);
    }
    for (name, count) in &spec.required_units {
        builder = builder.require_units(resolve(catalog, name)?, *count);
    }
    for (name, count) in &spec.optional_units {
        builder = builder.optional_units(resolve(catalog, name)?, *count);
    }
    builder.build().map_err(|e| e.to_string())
}
