//! Pure loading logic for Stowage.
//!
//! This crate moves resources from a depot's store into a vehicle's store
//! against a manifest of required and optional quantities, a little at a
//! time, across many short calls. It has no engine, database or clock of
//! its own: callers own the stores, decide who loads and when, and pass in
//! an effort budget per call.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Well-known resource ids grouped by kind, float tolerances |
//! | [`effort`] | Worker and background effort budgets per call |
//! | [`equipment`] | Identity-bearing equipment instances |
//! | [`error`] | Fault types for caller misuse |
//! | [`loading`] | Incremental loading controller and its status machine |
//! | [`manifest`] | Required/optional load manifests and capacity checks |
//! | [`quantity`] | Boundary validation for caller-supplied quantities |
//! | [`resources`] | Resource ids, kinds, unit masses and the catalog |
//! | [`store`] | Capacity-tracked container for amounts, items and equipment |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stowage_logic::constants::resource_ids::{FOOD, WATER};
//! use stowage_logic::loading::LoadingController;
//! use stowage_logic::manifest::ManifestBuilder;
//! use stowage_logic::resources::ResourceCatalog;
//! use stowage_logic::store::Store;
//!
//! let catalog = Arc::new(ResourceCatalog::standard());
//! let mut depot = Store::new("depot", catalog.clone());
//! depot.set_capacity(FOOD, 500.0).unwrap();
//! depot.set_capacity(WATER, 500.0).unwrap();
//! depot.store_amount(FOOD, 100.0).unwrap();
//! depot.store_amount(WATER, 100.0).unwrap();
//!
//! let mut rover = Store::new("rover", catalog.clone());
//! rover.set_capacity(FOOD, 50.0).unwrap();
//! rover.set_capacity(WATER, 50.0).unwrap();
//!
//! let manifest = ManifestBuilder::new(catalog)
//!     .require_amount(FOOD, 30.0)
//!     .require_amount(WATER, 10.0)
//!     .build()
//!     .unwrap();
//!
//! let mut controller = LoadingController::new(&depot, &rover, manifest).unwrap();
//! while !controller.load(&mut depot, &mut rover, 5.0).unwrap() {}
//! assert!(controller.is_completed());
//! assert_eq!(rover.stored_amount(FOOD), 30.0);
//! ```

pub mod constants;
pub mod effort;
pub mod equipment;
pub mod error;
pub mod loading;
pub mod manifest;
pub mod quantity;
pub mod resources;
pub mod store;
