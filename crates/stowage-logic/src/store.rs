//! Capacity-tracked resource container.
//!
//! A [`Store`] belongs to a holder (a depot, a rover, a cargo pod) and keeps
//! two ledgers behind one interface:
//! - a scalar ledger: kg for amount resources, a count for item resources
//! - an instance set for equipment, where "count of type T" is a filter
//!
//! Every resource needs a declared capacity before it can be stored. An id
//! that was never given a capacity behaves like capacity zero: storing it
//! returns everything as excess, retrieving it returns everything as
//! shortfall. Neither is an error.
//!
//! Capacity for discrete resources is a unit count; fractional limits are
//! rounded down when asking how many more units fit.
//!
//! ```
//! use std::sync::Arc;
//! use stowage_logic::constants::resource_ids::WATER;
//! use stowage_logic::resources::ResourceCatalog;
//! use stowage_logic::store::Store;
//!
//! let mut tank = Store::new("tank", Arc::new(ResourceCatalog::standard()));
//! tank.set_capacity(WATER, 200.0).unwrap();
//! assert_eq!(tank.store_amount(WATER, 250.0).unwrap(), 50.0);
//! assert_eq!(tank.retrieve_amount(WATER, 260.0).unwrap(), 60.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::equipment::{Equipment, EquipmentId};
use crate::error::StoreError;
use crate::quantity::{check_amount, is_negligible, positive_difference, whole_units};
use crate::resources::{ResourceCatalog, ResourceId, ResourceKind};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique store handle, used to bind a loading controller to its stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreId(pub u64);

impl StoreId {
    fn next() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// Capacity-tracked container for amount, item and equipment resources.
#[derive(Debug)]
pub struct Store {
    id: StoreId,
    owner: String,
    catalog: Arc<ResourceCatalog>,
    /// Declared limits: kg for amounts, units for items and equipment types.
    capacities: BTreeMap<ResourceId, f64>,
    amounts: BTreeMap<ResourceId, f64>,
    items: BTreeMap<ResourceId, u32>,
    equipment: BTreeMap<EquipmentId, Equipment>,
}

impl Store {
    pub fn new(owner: impl Into<String>, catalog: Arc<ResourceCatalog>) -> Self {
        Self {
            id: StoreId::next(),
            owner: owner.into(),
            catalog,
            capacities: BTreeMap::new(),
            amounts: BTreeMap::new(),
            items: BTreeMap::new(),
            equipment: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Name of the holder, for logs.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn catalog(&self) -> &Arc<ResourceCatalog> {
        &self.catalog
    }

    // ── Capacity ───────────────────────────────────────────────────────

    /// Declare (or replace) the limit for a resource.
    ///
    /// Lowering a limit below what is already stored keeps the contents;
    /// the store simply accepts nothing more of that resource until
    /// enough has been retrieved.
    pub fn set_capacity(&mut self, id: ResourceId, limit: f64) -> Result<(), StoreError> {
        self.kind_of(id)?;
        let limit = check_amount(limit)?;
        self.capacities.insert(id, limit);
        Ok(())
    }

    /// Declared limit, `0.0` if none was ever declared.
    pub fn capacity(&self, id: ResourceId) -> f64 {
        self.capacities.get(&id).copied().unwrap_or(0.0)
    }

    /// `max(0, limit - stored)`.
    pub fn remaining_capacity(&self, id: ResourceId) -> f64 {
        positive_difference(self.capacity(id), self.stored_quantity(id))
    }

    /// Whole units that still fit. Meaningful for items and equipment.
    pub fn remaining_unit_capacity(&self, id: ResourceId) -> u32 {
        let limit = whole_units(self.capacity(id));
        limit.saturating_sub(self.stored_units(id))
    }

    /// True iff a capacity was ever declared for `id`.
    pub fn is_resource_supported(&self, id: ResourceId) -> bool {
        self.capacities.contains_key(&id)
    }

    pub fn supports_amount(&self, id: ResourceId) -> bool {
        self.supports(id, ResourceKind::Amount)
    }

    pub fn supports_units(&self, id: ResourceId) -> bool {
        self.supports(id, ResourceKind::Item)
    }

    pub fn supports_instances(&self, id: ResourceId) -> bool {
        self.supports(id, ResourceKind::Equipment)
    }

    fn supports(&self, id: ResourceId, kind: ResourceKind) -> bool {
        self.is_resource_supported(id) && self.catalog.kind(id) == Some(kind)
    }

    /// Ids with a declared capacity, ascending.
    pub fn supported_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.capacities.keys().copied()
    }

    // ── Amount resources ───────────────────────────────────────────────

    /// Absorb up to the remaining capacity; returns the unabsorbed excess.
    pub fn store_amount(&mut self, id: ResourceId, amount: f64) -> Result<f64, StoreError> {
        let amount = check_amount(amount)?;
        self.expect_kind(id, ResourceKind::Amount)?;
        let absorbed = amount.min(self.remaining_capacity(id));
        if absorbed > 0.0 {
            *self.amounts.entry(id).or_insert(0.0) += absorbed;
        }
        Ok(amount - absorbed)
    }

    /// Remove up to what is stored; returns the unmet shortfall.
    pub fn retrieve_amount(&mut self, id: ResourceId, amount: f64) -> Result<f64, StoreError> {
        let amount = check_amount(amount)?;
        self.expect_kind(id, ResourceKind::Amount)?;
        let stored = self.stored_amount(id);
        let taken = amount.min(stored);
        let left = stored - taken;
        if is_negligible(left) {
            self.amounts.remove(&id);
        } else {
            self.amounts.insert(id, left);
        }
        Ok(amount - taken)
    }

    /// Stored kg of an amount resource, `0.0` for anything else.
    pub fn stored_amount(&self, id: ResourceId) -> f64 {
        self.amounts.get(&id).copied().unwrap_or(0.0)
    }

    // ── Item resources ─────────────────────────────────────────────────

    /// Absorb up to the remaining unit capacity; returns the excess count.
    pub fn store_items(&mut self, id: ResourceId, count: u32) -> Result<u32, StoreError> {
        self.expect_kind(id, ResourceKind::Item)?;
        let absorbed = count.min(self.remaining_unit_capacity(id));
        if absorbed > 0 {
            *self.items.entry(id).or_insert(0) += absorbed;
        }
        Ok(count - absorbed)
    }

    /// Remove up to what is stored; returns the shortfall count.
    pub fn retrieve_items(&mut self, id: ResourceId, count: u32) -> Result<u32, StoreError> {
        self.expect_kind(id, ResourceKind::Item)?;
        let stored = self.items.get(&id).copied().unwrap_or(0);
        let taken = count.min(stored);
        if stored == taken {
            self.items.remove(&id);
        } else {
            self.items.insert(id, stored - taken);
        }
        Ok(count - taken)
    }

    // ── Equipment ──────────────────────────────────────────────────────

    /// Add one instance. Returns it back as `Some` when there is no room.
    pub fn store_equipment(&mut self, item: Equipment) -> Result<Option<Equipment>, StoreError> {
        self.expect_kind(item.kind, ResourceKind::Equipment)?;
        if self.equipment.contains_key(&item.id) {
            return Err(StoreError::DuplicateEquipment(item.id));
        }
        if self.remaining_unit_capacity(item.kind) == 0 {
            return Ok(Some(item));
        }
        self.equipment.insert(item.id, item);
        Ok(None)
    }

    /// Remove up to `count` instances of a type, lowest ids first.
    ///
    /// The shortfall is `count - returned.len()`.
    pub fn retrieve_equipment(
        &mut self,
        kind: ResourceId,
        count: u32,
    ) -> Result<Vec<Equipment>, StoreError> {
        self.expect_kind(kind, ResourceKind::Equipment)?;
        let chosen: Vec<EquipmentId> = self
            .equipment_of(kind)
            .take(count as usize)
            .map(|e| e.id)
            .collect();
        Ok(chosen
            .into_iter()
            .filter_map(|id| self.equipment.remove(&id))
            .collect())
    }

    /// Remove one specific instance.
    pub fn take_equipment(&mut self, id: EquipmentId) -> Option<Equipment> {
        self.equipment.remove(&id)
    }

    pub fn contains_equipment(&self, id: EquipmentId) -> bool {
        self.equipment.contains_key(&id)
    }

    /// Instances of one type, ascending id.
    pub fn equipment_of(&self, kind: ResourceId) -> impl Iterator<Item = &Equipment> + '_ {
        self.equipment.values().filter(move |e| e.kind == kind)
    }

    /// Every instance held, ascending id.
    pub fn all_equipment(&self) -> impl Iterator<Item = &Equipment> + '_ {
        self.equipment.values()
    }

    // ── Unified queries ────────────────────────────────────────────────

    /// Whole units held of an item resource or equipment type.
    pub fn stored_units(&self, id: ResourceId) -> u32 {
        match self.catalog.kind(id) {
            Some(ResourceKind::Item) => self.items.get(&id).copied().unwrap_or(0),
            Some(ResourceKind::Equipment) => self.equipment_of(id).count() as u32,
            _ => 0,
        }
    }

    /// Stored quantity in the resource's own unit (kg or count).
    pub fn stored_quantity(&self, id: ResourceId) -> f64 {
        match self.catalog.kind(id) {
            Some(ResourceKind::Amount) => self.stored_amount(id),
            Some(_) => self.stored_units(id) as f64,
            None => 0.0,
        }
    }

    /// Mass in kg held of one resource.
    pub fn stored_mass_of(&self, id: ResourceId) -> f64 {
        self.stored_quantity(id) * self.catalog.unit_mass(id)
    }

    /// Sum of `stored × unit mass` over every resource held.
    pub fn stored_mass(&self) -> f64 {
        let amounts: f64 = self
            .amounts
            .iter()
            .map(|(id, kg)| kg * self.catalog.unit_mass(*id))
            .sum();
        let items: f64 = self
            .items
            .iter()
            .map(|(id, n)| *n as f64 * self.catalog.unit_mass(*id))
            .sum();
        let equipment: f64 = self
            .equipment
            .values()
            .map(|e| self.catalog.unit_mass(e.kind))
            .sum();
        amounts + items + equipment
    }

    /// Mass in kg if every declared capacity were full.
    pub fn total_capacity_mass(&self) -> f64 {
        self.capacities
            .iter()
            .map(|(id, limit)| {
                let limit = match self.catalog.kind(*id) {
                    Some(ResourceKind::Amount) => *limit,
                    _ => whole_units(*limit) as f64,
                };
                limit * self.catalog.unit_mass(*id)
            })
            .sum()
    }

    /// Stored mass over capacity mass, clamped to `[0, 1]`.
    pub fn load_factor(&self) -> f64 {
        let cap = self.total_capacity_mass();
        if cap <= 0.0 {
            0.0
        } else {
            (self.stored_mass() / cap).clamp(0.0, 1.0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty() && self.items.is_empty() && self.equipment.is_empty()
    }

    // ── Transfers ──────────────────────────────────────────────────────

    /// Move up to `amount` kg into `dest`. Returns the kg actually moved.
    ///
    /// Whatever leaves this store arrives in `dest`; any excess the
    /// destination refuses is put back here.
    pub fn transfer_amount_to(
        &mut self,
        dest: &mut Store,
        id: ResourceId,
        amount: f64,
    ) -> Result<f64, StoreError> {
        let amount = check_amount(amount)?;
        self.expect_kind(id, ResourceKind::Amount)?;
        dest.expect_kind(id, ResourceKind::Amount)?;
        let wanted = amount
            .min(self.stored_amount(id))
            .min(dest.remaining_capacity(id));
        if wanted <= 0.0 {
            return Ok(0.0);
        }
        let shortfall = self.retrieve_amount(id, wanted)?;
        let taken = wanted - shortfall;
        let excess = dest.store_amount(id, taken)?;
        if excess > 0.0 {
            self.restore_amount(id, excess);
        }
        Ok(taken - excess)
    }

    /// Move up to `count` whole units (items or equipment) into `dest`.
    /// Returns the number of units actually moved.
    pub fn transfer_units_to(
        &mut self,
        dest: &mut Store,
        id: ResourceId,
        count: u32,
    ) -> Result<u32, StoreError> {
        let kind = self.kind_of(id)?;
        dest.expect_kind(id, kind)?;
        let wanted = count
            .min(self.stored_units(id))
            .min(dest.remaining_unit_capacity(id));
        if wanted == 0 {
            return Ok(0);
        }
        match kind {
            ResourceKind::Item => {
                let shortfall = self.retrieve_items(id, wanted)?;
                let taken = wanted - shortfall;
                let excess = dest.store_items(id, taken)?;
                if excess > 0 {
                    *self.items.entry(id).or_insert(0) += excess;
                }
                Ok(taken - excess)
            }
            ResourceKind::Equipment => self.transfer_instances_to(dest, id, wanted),
            ResourceKind::Amount => Err(StoreError::KindMismatch {
                id,
                expected: ResourceKind::Item,
                found: ResourceKind::Amount,
            }),
        }
    }

    fn transfer_instances_to(
        &mut self,
        dest: &mut Store,
        kind: ResourceId,
        count: u32,
    ) -> Result<u32, StoreError> {
        let taken = self.retrieve_equipment(kind, count)?;
        if let Some(dup) = taken.iter().find(|e| dest.contains_equipment(e.id)) {
            let dup = dup.id;
            for item in taken {
                self.restore_equipment(item);
            }
            return Err(StoreError::DuplicateEquipment(dup));
        }
        let mut moved = 0;
        for item in taken {
            match dest.store_equipment(item)? {
                None => moved += 1,
                Some(rejected) => self.restore_equipment(rejected),
            }
        }
        Ok(moved)
    }

    // Put-backs skip the capacity check: the quantity was just removed.
    fn restore_amount(&mut self, id: ResourceId, amount: f64) {
        *self.amounts.entry(id).or_insert(0.0) += amount;
    }

    fn restore_equipment(&mut self, item: Equipment) {
        self.equipment.insert(item.id, item);
    }

    fn kind_of(&self, id: ResourceId) -> Result<ResourceKind, StoreError> {
        self.catalog
            .kind(id)
            .ok_or(StoreError::UnknownResource(id))
    }

    fn expect_kind(&self, id: ResourceId, expected: ResourceKind) -> Result<(), StoreError> {
        let found = self.kind_of(id)?;
        if found != expected {
            return Err(StoreError::KindMismatch {
                id,
                expected,
                found,
            });
        }
        Ok(())
    }
}
