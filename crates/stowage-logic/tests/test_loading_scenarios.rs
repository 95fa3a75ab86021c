//! Integration tests for depot-to-vehicle loading.
//!
//! Exercises: ResourceCatalog → Store → ManifestBuilder → LoadingController
//!
//! All tests are pure logic: stores are plain values, effort is a number.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stowage_logic::constants::resource_ids::*;
use stowage_logic::effort::{background_effort, worker_effort, EffortConfig, WorkerAttributes};
use stowage_logic::equipment::EquipmentFactory;
use stowage_logic::loading::{LoadingController, LoadingStatus, MAX_SETTLEMENT_ATTEMPTS};
use stowage_logic::manifest::{Manifest, ManifestBuilder};
use stowage_logic::resources::{ResourceCatalog, ResourceId, ResourceKind};
use stowage_logic::store::Store;

// ── Helpers ────────────────────────────────────────────────────────────

fn catalog() -> Arc<ResourceCatalog> {
    Arc::new(ResourceCatalog::standard())
}

/// A depot with generous capacity and stock of everything in the catalog
/// except methane.
fn stocked_depot(catalog: &Arc<ResourceCatalog>) -> Store {
    let mut depot = Store::new("depot", catalog.clone());
    let mut factory = EquipmentFactory::starting_at(1);
    for spec in catalog.iter() {
        depot.set_capacity(spec.id, 1000.0).unwrap();
        if spec.id == METHANE {
            continue;
        }
        match spec.kind {
            ResourceKind::Amount => {
                depot.store_amount(spec.id, 500.0).unwrap();
            }
            ResourceKind::Item => {
                depot.store_items(spec.id, 20).unwrap();
            }
            ResourceKind::Equipment => {
                for e in factory.make_many(spec.id, 6) {
                    depot.store_equipment(e).unwrap();
                }
            }
        }
    }
    depot
}

fn empty_rover(catalog: &Arc<ResourceCatalog>) -> Store {
    let mut rover = Store::new("rover", catalog.clone());
    for spec in catalog.iter() {
        rover.set_capacity(spec.id, 200.0).unwrap();
    }
    rover
}

/// Call `load` until it completes or fails; returns the call count.
fn run_to_end(
    controller: &mut LoadingController,
    depot: &mut Store,
    rover: &mut Store,
    effort: f64,
    max_calls: u32,
) -> u32 {
    for call in 1..=max_calls {
        let done = controller.load(depot, rover, effort).unwrap();
        if done || controller.is_failure() {
            return call;
        }
    }
    panic!("controller still {:?} after {max_calls} calls", controller.status());
}

fn expedition_manifest(catalog: &Arc<ResourceCatalog>) -> Manifest {
    ManifestBuilder::new(catalog.clone())
        .require_amount(OXYGEN, 40.0)
        .require_amount(WATER, 60.0)
        .require_amount(FOOD, 25.5)
        .require_units(SPARE_PARTS, 4)
        .require_units(EVA_SUIT, 2)
        .optional_amount(FOOD, 10.0)
        .optional_units(SPECIMEN_BOX, 3)
        .build()
        .unwrap()
}

// ── Testable properties ────────────────────────────────────────────────

#[test]
fn test_food_and_water_complete_before_200_calls() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(FOOD, 30.0)
        .require_amount(WATER, 10.0)
        .build()
        .unwrap();
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    let calls = run_to_end(&mut controller, &mut depot, &mut rover, 1.0, 200);
    assert!(calls < 200, "took {calls} calls");
    assert!(controller.is_completed());
    assert_eq!(rover.stored_amount(FOOD), 30.0);
    assert_eq!(rover.stored_amount(WATER), 10.0);
}

#[test]
fn test_reload_of_loaded_vehicle_is_noop() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);

    let mut first = LoadingController::new(&depot, &rover, expedition_manifest(&cat)).unwrap();
    run_to_end(&mut first, &mut depot, &mut rover, 10.0, 100);
    assert!(first.is_completed());

    let depot_mass = depot.stored_mass();
    let rover_mass = rover.stored_mass();
    let mut second = LoadingController::new(&depot, &rover, expedition_manifest(&cat)).unwrap();
    assert!(second.load(&mut depot, &mut rover, 10.0).unwrap());
    assert_eq!(depot.stored_mass(), depot_mass);
    assert_eq!(rover.stored_mass(), rover_mass);
    let progress = second.progress(&rover);
    assert_eq!(progress.moved_amount, 0.0);
    assert_eq!(progress.moved_units, 0);
}

#[test]
fn test_amount_transfers_conserve_mass() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let before = depot.stored_mass() + rover.stored_mass();

    let mut controller = LoadingController::new(&depot, &rover, expedition_manifest(&cat)).unwrap();
    for _ in 0..7 {
        controller.load(&mut depot, &mut rover, 3.3).unwrap();
        let total = depot.stored_mass() + rover.stored_mass();
        assert!((total - before).abs() < 1e-6, "mass drifted: {before} -> {total}");
        for id in [OXYGEN, WATER, FOOD] {
            assert!(
                (depot.stored_amount(id) + rover.stored_amount(id) - 500.0).abs() < 1e-9,
                "{id} not conserved"
            );
        }
    }
}

#[test]
fn test_completion_bounded_by_total_over_budget() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(OXYGEN, 40.0)
        .require_amount(WATER, 60.0)
        .require_units(WRENCH, 6)
        .build()
        .unwrap();
    let total = 40.0 + 60.0 + 6.0;
    let effort = 4.0;
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    let calls = run_to_end(&mut controller, &mut depot, &mut rover, effort, 1000);
    assert!(controller.is_completed());
    assert!(
        calls as f64 <= (total / effort).ceil() + 1.0,
        "{calls} calls for {total} at {effort} per call"
    );
}

#[test]
fn test_optional_missing_at_source_is_ignored() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(WATER, 20.0)
        .optional_amount(METHANE, 15.0)
        .build()
        .unwrap();
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    run_to_end(&mut controller, &mut depot, &mut rover, 5.0, 50);
    assert!(controller.is_completed());
    assert_eq!(rover.stored_amount(METHANE), 0.0);
    assert_eq!(controller.progress(&rover).skipped_optional, vec![METHANE]);
}

#[test]
fn test_required_never_supplied_fails_after_exact_limit() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(WATER, 5.0)
        .require_amount(METHANE, 5.0)
        .build()
        .unwrap();
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    let calls = run_to_end(&mut controller, &mut depot, &mut rover, 100.0, 100);
    assert_eq!(calls, MAX_SETTLEMENT_ATTEMPTS);
    assert!(controller.is_failure());
    assert!(!controller.is_completed());
    assert_eq!(controller.status(), LoadingStatus::Failed);
    assert_eq!(rover.stored_amount(WATER), 5.0, "available entries still load");
}

#[test]
fn test_several_missing_required_still_fail_after_exact_limit() {
    let cat = catalog();
    let mut depot = Store::new("empty depot", cat.clone());
    let mut rover = empty_rover(&cat);
    let mut controller = LoadingController::new(&depot, &rover, expedition_manifest(&cat)).unwrap();

    let calls = run_to_end(&mut controller, &mut depot, &mut rover, 10.0, 100);
    assert_eq!(calls, MAX_SETTLEMENT_ATTEMPTS);
    assert!(controller.is_failure());
}

#[test]
fn test_late_delivery_rescues_load() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(METHANE, 30.0)
        .build()
        .unwrap();
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    for _ in 0..MAX_SETTLEMENT_ATTEMPTS - 1 {
        assert!(!controller.load(&mut depot, &mut rover, 10.0).unwrap());
    }
    // Production elsewhere fills the depot just in time.
    depot.store_amount(METHANE, 100.0).unwrap();
    run_to_end(&mut controller, &mut depot, &mut rover, 10.0, 10);
    assert!(controller.is_completed());
    assert_eq!(rover.stored_amount(METHANE), 30.0);
}

#[test]
fn test_destination_touched_between_calls() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(WATER, 30.0)
        .build()
        .unwrap();
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    controller.load(&mut depot, &mut rover, 10.0).unwrap();
    // Crew drinks some of what was loaded, someone else tops up.
    rover.retrieve_amount(WATER, 4.0).unwrap();
    controller.load(&mut depot, &mut rover, 10.0).unwrap();
    rover.store_amount(WATER, 10.0).unwrap();
    run_to_end(&mut controller, &mut depot, &mut rover, 10.0, 10);
    assert_eq!(rover.stored_amount(WATER), 30.0, "need recomputed from stores");
}

#[test]
fn test_full_expedition_with_equipment() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let mut controller = LoadingController::new(&depot, &rover, expedition_manifest(&cat)).unwrap();

    run_to_end(&mut controller, &mut depot, &mut rover, 7.0, 100);
    assert!(controller.is_completed());
    assert_eq!(rover.stored_amount(FOOD), 35.5, "required plus optional");
    assert_eq!(rover.stored_units(SPARE_PARTS), 4);
    assert_eq!(rover.stored_units(EVA_SUIT), 2);
    assert_eq!(rover.stored_units(SPECIMEN_BOX), 3);
    assert_eq!(depot.stored_units(EVA_SUIT), 4);
    for suit in rover.equipment_of(EVA_SUIT) {
        assert!(!depot.contains_equipment(suit.id));
    }
    assert!(controller.progress(&rover).outstanding.is_fully_satisfied());
}

#[test]
fn test_effort_model_drives_loading() {
    let cat = catalog();
    let mut depot = stocked_depot(&cat);
    let mut rover = empty_rover(&cat);
    let config = EffortConfig::default();
    let worker = WorkerAttributes {
        strength: 70.0,
        skill: 2,
        fatigue: 0.2,
    };
    let mut controller = LoadingController::new(&depot, &rover, expedition_manifest(&cat)).unwrap();

    let mut calls = 0;
    loop {
        calls += 1;
        let effort = worker_effort(&worker, 0.5, &config) + background_effort(0.5, &config);
        if controller.load(&mut depot, &mut rover, effort).unwrap() {
            break;
        }
        assert!(calls < 100);
    }
    assert!(controller.is_completed());
}

// ── Store invariants ───────────────────────────────────────────────────

#[test]
fn test_random_store_sequences_hold_invariants() {
    let cat = catalog();
    let mut rng = StdRng::seed_from_u64(7);
    let ids: Vec<ResourceId> = vec![WATER, FOOD, WRENCH, BATTERY];
    let mut store = Store::new("random", cat.clone());
    for id in &ids {
        store.set_capacity(*id, rng.gen_range(0.0..150.0)).unwrap();
    }

    for _ in 0..2000 {
        let id = ids[rng.gen_range(0..ids.len())];
        let storing = rng.gen_bool(0.5);
        match cat.kind(id) {
            Some(ResourceKind::Amount) => {
                let qty = rng.gen_range(0.0..80.0);
                let before = store.stored_amount(id);
                if storing {
                    let excess = store.store_amount(id, qty).unwrap();
                    assert!((store.stored_amount(id) - before - (qty - excess)).abs() < 1e-9);
                } else {
                    let shortfall = store.retrieve_amount(id, qty).unwrap();
                    assert!((before - store.stored_amount(id) - (qty - shortfall)).abs() < 1e-9);
                }
            }
            _ => {
                let qty = rng.gen_range(0..40);
                if storing {
                    store.store_items(id, qty).unwrap();
                } else {
                    store.retrieve_items(id, qty).unwrap();
                }
            }
        }

        for id in &ids {
            let stored = store.stored_quantity(*id);
            assert!(stored >= 0.0);
            assert!(stored <= store.capacity(*id) + 1e-9, "{id} over capacity");
        }
        let expected: f64 = ids.iter().map(|id| store.stored_mass_of(*id)).sum();
        assert!((store.stored_mass() - expected).abs() < 1e-6);
    }
}

#[test]
fn test_random_replenishment_never_breaks_controller() {
    let cat = catalog();
    let mut rng = StdRng::seed_from_u64(11);
    let mut depot = Store::new("depot", cat.clone());
    depot.set_capacity(OXYGEN, 1000.0).unwrap();
    depot.set_capacity(HYDROGEN, 1000.0).unwrap();
    let mut rover = empty_rover(&cat);
    let manifest = ManifestBuilder::new(cat.clone())
        .require_amount(OXYGEN, 50.0)
        .optional_amount(HYDROGEN, 20.0)
        .build()
        .unwrap();
    let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();

    for _ in 0..500 {
        // Intermittent production at the depot.
        if rng.gen_bool(0.6) {
            depot.store_amount(OXYGEN, rng.gen_range(0.0..6.0)).unwrap();
        }
        if rng.gen_bool(0.3) {
            depot.store_amount(HYDROGEN, rng.gen_range(0.0..3.0)).unwrap();
        }
        controller.load(&mut depot, &mut rover, 4.0).unwrap();
        assert!(!(controller.is_completed() && controller.is_failure()));
        if controller.status().is_terminal() {
            break;
        }
    }
    assert!(controller.status().is_terminal());
    if controller.is_completed() {
        assert!((rover.stored_amount(OXYGEN) - 50.0).abs() < 1e-9);
    }
}
