//! Load manifests: what a transfer must move and what it should move.
//!
//! A [`Manifest`] holds four immutable maps:
//! - required amounts (kg) and optional amounts (kg), amount resources only
//! - required units and optional units, item resources and equipment types
//!
//! Maps are ordered by resource id so every consumer walks them in the
//! same order. Optional quantities are on top of any required quantity of
//! the same id: requiring 20 kg of water and offering 10 kg optional means
//! "at least 20, ideally 30".
//!
//! Outstanding need is never stored here. It is always `target − stored`
//! against whatever the destination holds right now.
//!
//! ```
//! use std::sync::Arc;
//! use stowage_logic::constants::resource_ids::{FOOD, WRENCH};
//! use stowage_logic::manifest::ManifestBuilder;
//! use stowage_logic::resources::ResourceCatalog;
//!
//! let manifest = ManifestBuilder::new(Arc::new(ResourceCatalog::standard()))
//!     .require_amount(FOOD, 30.0)
//!     .optional_units(WRENCH, 2)
//!     .build()
//!     .unwrap();
//! assert!(!manifest.is_empty());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::quantity::{check_amount, positive_difference};
use crate::resources::{ResourceCatalog, ResourceId, ResourceKind};
use crate::store::Store;

/// Immutable required/optional quantities for one load operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    catalog: Arc<ResourceCatalog>,
    required_amounts: BTreeMap<ResourceId, f64>,
    optional_amounts: BTreeMap<ResourceId, f64>,
    required_units: BTreeMap<ResourceId, u32>,
    optional_units: BTreeMap<ResourceId, u32>,
}

/// Quantities still missing from a destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Outstanding {
    /// kg of required amount resources.
    pub required_amount: f64,
    /// kg of optional amount resources.
    pub optional_amount: f64,
    /// Whole units, summed in `u64` so large manifests cannot wrap.
    pub required_units: u64,
    pub optional_units: u64,
}

impl Outstanding {
    pub fn is_required_satisfied(&self) -> bool {
        self.required_amount <= 0.0 && self.required_units == 0
    }

    pub fn is_fully_satisfied(&self) -> bool {
        self.is_required_satisfied() && self.optional_amount <= 0.0 && self.optional_units == 0
    }
}

/// A manifest entry the destination cannot hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityShortfall {
    pub id: ResourceId,
    /// Outstanding quantity (kg or units).
    pub needed: f64,
    /// Remaining destination capacity (kg or units).
    pub available: f64,
    pub optional: bool,
}

impl fmt::Display for CapacityShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} needs {:.2} but only {:.2} fits{}",
            self.id,
            self.needed,
            self.available,
            if self.optional { " (optional)" } else { "" }
        )
    }
}

impl Manifest {
    pub fn catalog(&self) -> &Arc<ResourceCatalog> {
        &self.catalog
    }

    pub fn required_amounts(&self) -> &BTreeMap<ResourceId, f64> {
        &self.required_amounts
    }

    pub fn optional_amounts(&self) -> &BTreeMap<ResourceId, f64> {
        &self.optional_amounts
    }

    pub fn required_units(&self) -> &BTreeMap<ResourceId, u32> {
        &self.required_units
    }

    pub fn optional_units(&self) -> &BTreeMap<ResourceId, u32> {
        &self.optional_units
    }

    pub fn is_empty(&self) -> bool {
        self.required_amounts.is_empty()
            && self.optional_amounts.is_empty()
            && self.required_units.is_empty()
            && self.optional_units.is_empty()
    }

    /// Every id the manifest mentions, ascending, without duplicates.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let ids: BTreeSet<ResourceId> = self
            .required_amounts
            .keys()
            .chain(self.optional_amounts.keys())
            .chain(self.required_units.keys())
            .chain(self.optional_units.keys())
            .copied()
            .collect();
        ids.into_iter().collect()
    }

    // ── Per-entry outstanding need ─────────────────────────────────────

    pub fn required_amount_outstanding(&self, id: ResourceId, dest: &Store) -> f64 {
        let target = self.required_amounts.get(&id).copied().unwrap_or(0.0);
        positive_difference(target, dest.stored_amount(id))
    }

    pub fn optional_amount_outstanding(&self, id: ResourceId, dest: &Store) -> f64 {
        let Some(extra) = self.optional_amounts.get(&id).copied() else {
            return 0.0;
        };
        let base = self.required_amounts.get(&id).copied().unwrap_or(0.0);
        positive_difference(base + extra, dest.stored_amount(id))
    }

    pub fn required_units_outstanding(&self, id: ResourceId, dest: &Store) -> u32 {
        let target = self.required_units.get(&id).copied().unwrap_or(0);
        target.saturating_sub(dest.stored_units(id))
    }

    pub fn optional_units_outstanding(&self, id: ResourceId, dest: &Store) -> u32 {
        let Some(extra) = self.optional_units.get(&id).copied() else {
            return 0;
        };
        let base = self.required_units.get(&id).copied().unwrap_or(0);
        base.saturating_add(extra)
            .saturating_sub(dest.stored_units(id))
    }

    // ── Aggregates ─────────────────────────────────────────────────────

    /// Sum of outstanding need across every entry.
    pub fn total_outstanding(&self, dest: &Store) -> Outstanding {
        Outstanding {
            required_amount: self
                .required_amounts
                .keys()
                .map(|id| self.required_amount_outstanding(*id, dest))
                .sum(),
            optional_amount: self
                .optional_amounts
                .keys()
                .map(|id| self.optional_amount_outstanding(*id, dest))
                .sum(),
            required_units: self
                .required_units
                .keys()
                .map(|id| u64::from(self.required_units_outstanding(*id, dest)))
                .sum(),
            optional_units: self
                .optional_units
                .keys()
                .map(|id| u64::from(self.optional_units_outstanding(*id, dest)))
                .sum(),
        }
    }

    /// Whether the destination holds every required quantity.
    pub fn is_satisfied_by(&self, dest: &Store) -> bool {
        self.required_amounts
            .keys()
            .all(|id| self.required_amount_outstanding(*id, dest) <= 0.0)
            && self
                .required_units
                .keys()
                .all(|id| self.required_units_outstanding(*id, dest) == 0)
    }

    /// Mass in kg of every required entry.
    pub fn required_mass(&self) -> f64 {
        self.mass_of(&self.required_amounts, &self.required_units)
    }

    /// Mass in kg of every optional entry.
    pub fn optional_mass(&self) -> f64 {
        self.mass_of(&self.optional_amounts, &self.optional_units)
    }

    fn mass_of(&self, amounts: &BTreeMap<ResourceId, f64>, units: &BTreeMap<ResourceId, u32>) -> f64 {
        let a: f64 = amounts
            .iter()
            .map(|(id, kg)| kg * self.catalog.unit_mass(*id))
            .sum();
        let u: f64 = units
            .iter()
            .map(|(id, n)| *n as f64 * self.catalog.unit_mass(*id))
            .sum();
        a + u
    }

    /// Entries whose outstanding need exceeds the destination's remaining
    /// capacity. Loading never grows capacity, so callers check this first.
    pub fn check_capacity(&self, dest: &Store) -> Vec<CapacityShortfall> {
        let mut shortfalls = Vec::new();
        for id in self.required_amounts.keys() {
            let needed = self.required_amount_outstanding(*id, dest);
            push_if_short(&mut shortfalls, *id, needed, dest.remaining_capacity(*id), false);
        }
        for id in self.required_units.keys() {
            let needed = self.required_units_outstanding(*id, dest) as f64;
            let available = dest.remaining_unit_capacity(*id) as f64;
            push_if_short(&mut shortfalls, *id, needed, available, false);
        }
        for id in self.optional_amounts.keys() {
            let needed = self.optional_amount_outstanding(*id, dest);
            push_if_short(&mut shortfalls, *id, needed, dest.remaining_capacity(*id), true);
        }
        for id in self.optional_units.keys() {
            let needed = self.optional_units_outstanding(*id, dest) as f64;
            let available = dest.remaining_unit_capacity(*id) as f64;
            push_if_short(&mut shortfalls, *id, needed, available, true);
        }
        shortfalls
    }
}

fn push_if_short(
    out: &mut Vec<CapacityShortfall>,
    id: ResourceId,
    needed: f64,
    available: f64,
    optional: bool,
) {
    if positive_difference(needed, available) > 0.0 {
        out.push(CapacityShortfall {
            id,
            needed,
            available,
            optional,
        });
    }
}

/// Validating builder for [`Manifest`].
///
/// Setting the same id twice in one map keeps the last value. Zero
/// quantities are dropped.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    catalog: Arc<ResourceCatalog>,
    required_amounts: BTreeMap<ResourceId, f64>,
    optional_amounts: BTreeMap<ResourceId, f64>,
    required_units: BTreeMap<ResourceId, u32>,
    optional_units: BTreeMap<ResourceId, u32>,
}

impl ManifestBuilder {
    pub fn new(catalog: Arc<ResourceCatalog>) -> Self {
        Self {
            catalog,
            required_amounts: BTreeMap::new(),
            optional_amounts: BTreeMap::new(),
            required_units: BTreeMap::new(),
            optional_units: BTreeMap::new(),
        }
    }

    pub fn require_amount(mut self, id: ResourceId, kg: f64) -> Self {
        self.required_amounts.insert(id, kg);
        self
    }

    pub fn optional_amount(mut self, id: ResourceId, kg: f64) -> Self {
        self.optional_amounts.insert(id, kg);
        self
    }

    pub fn require_units(mut self, id: ResourceId, count: u32) -> Self {
        self.required_units.insert(id, count);
        self
    }

    pub fn optional_units(mut self, id: ResourceId, count: u32) -> Self {
        self.optional_units.insert(id, count);
        self
    }

    pub fn build(self) -> Result<Manifest, ManifestError> {
        let catalog = self.catalog;
        let required_amounts = validate_amounts(&catalog, self.required_amounts)?;
        let optional_amounts = validate_amounts(&catalog, self.optional_amounts)?;
        let required_units = validate_units(&catalog, self.required_units)?;
        let optional_units = validate_units(&catalog, self.optional_units)?;
        Ok(Manifest {
            catalog,
            required_amounts,
            optional_amounts,
            required_units,
            optional_units,
        })
    }
}

fn validate_amounts(
    catalog: &ResourceCatalog,
    entries: BTreeMap<ResourceId, f64>,
) -> Result<BTreeMap<ResourceId, f64>, ManifestError> {
    let mut out = BTreeMap::new();
    for (id, kg) in entries {
        let kind = catalog.kind(id).ok_or(ManifestError::UnknownResource(id))?;
        if kind != ResourceKind::Amount {
            return Err(ManifestError::KindMismatch {
                id,
                expected: "an amount resource",
                found: kind,
            });
        }
        let kg = check_amount(kg).map_err(|source| ManifestError::Quantity { id, source })?;
        if kg > 0.0 {
            out.insert(id, kg);
        }
    }
    Ok(out)
}

fn validate_units(
    catalog: &ResourceCatalog,
    entries: BTreeMap<ResourceId, u32>,
) -> Result<BTreeMap<ResourceId, u32>, ManifestError> {
    let mut out = BTreeMap::new();
    for (id, count) in entries {
        let kind = catalog.kind(id).ok_or(ManifestError::UnknownResource(id))?;
        if !kind.is_discrete() {
            return Err(ManifestError::KindMismatch {
                id,
                expected: "an item or equipment type",
                found: kind,
            });
        }
        if count > 0 {
            out.insert(id, count);
        }
    }
    Ok(out)
}
