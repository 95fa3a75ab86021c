//! Incremental loading controller.
//!
//! A [`LoadingController`] moves a [`Manifest`] from a source store (a
//! depot) into a destination store (a vehicle) a little at a time. Each
//! call to [`load`](LoadingController::load) spends at most the effort
//! budget it is given and then returns; callers invoke it once per tick
//! until it reports completion or [`is_failure`](LoadingController::is_failure)
//! turns true.
//!
//! # Status machine
//!
//! ```text
//! NotStarted ──load──▶ InProgress ──▶ Completed   (terminal)
//!                           │
//!                           └───────▶ Failed      (terminal)
//! ```
//!
//! # Per call
//!
//! 1. Terminal status: return the cached result, touch nothing.
//! 2. Required entries, ascending id (amounts, then units). An entry the
//!    source holds none of is a shortfall for this call; otherwise move
//!    `min(budget, need, source, room)`, whole units for discrete kinds.
//! 3. Once every required entry is met, optional entries get the rest of
//!    the budget. An optional entry the source has none of (or the
//!    destination has no room for) is dropped for good.
//! 4. All required met and every optional met or dropped: `Completed`.
//! 5. A required entry has been missing at the source for
//!    `max_settlement_attempts` calls in a row: `Failed`.
//!
//! Outstanding need is recomputed from the destination on every call, so
//! other code may touch either store between calls.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LoadingError, StoreRole};
use crate::manifest::{Manifest, Outstanding};
use crate::quantity::{check_amount, is_negligible, whole_units};
use crate::resources::{ResourceCatalog, ResourceId};
use crate::store::{Store, StoreId};

/// Consecutive calls a required resource may be missing at the source
/// before the load is declared failed.
pub const MAX_SETTLEMENT_ATTEMPTS: u32 = 5;

/// Where a load stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadingStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl LoadingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadingStatus::Completed | LoadingStatus::Failed)
    }
}

impl fmt::Display for LoadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingStatus::NotStarted => write!(f, "not started"),
            LoadingStatus::InProgress => write!(f, "in progress"),
            LoadingStatus::Completed => write!(f, "completed"),
            LoadingStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Tuning for a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// Shortfall streak that fails the load. `0` is treated as `1`.
    pub max_settlement_attempts: u32,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            max_settlement_attempts: MAX_SETTLEMENT_ATTEMPTS,
        }
    }
}

impl LoadingConfig {
    fn attempt_limit(&self) -> u32 {
        self.max_settlement_attempts.max(1)
    }
}

/// Snapshot of a controller for logs and operator tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingProgress {
    pub status: LoadingStatus,
    pub calls: u32,
    pub settlement_shortfall_streak: u32,
    pub max_settlement_attempts: u32,
    pub outstanding: Outstanding,
    /// kg of amount resources moved by this controller.
    pub moved_amount: f64,
    /// Whole units moved by this controller.
    pub moved_units: u64,
    /// Optional entries given up on, ascending id.
    pub skipped_optional: Vec<ResourceId>,
}

impl fmt::Display for LoadingProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} calls: moved {:.2} kg + {} units; outstanding {:.2} kg + {} units required, {:.2} kg + {} units optional",
            self.status,
            self.calls,
            self.moved_amount,
            self.moved_units,
            self.outstanding.required_amount,
            self.outstanding.required_units,
            self.outstanding.optional_amount,
            self.outstanding.optional_units,
        )?;
        if self.settlement_shortfall_streak > 0 {
            write!(
                f,
                "; shortfall streak {}/{}",
                self.settlement_shortfall_streak, self.max_settlement_attempts
            )?;
        }
        if !self.skipped_optional.is_empty() {
            write!(f, "; skipped {} optional", self.skipped_optional.len())?;
        }
        Ok(())
    }
}

/// Stateful loader bound to one (source, destination, manifest) triple.
///
/// The controller owns no stores. It remembers their ids and is handed the
/// stores again on every call, so the depot and vehicle stay free to be
/// used by other code in between.
#[derive(Debug)]
pub struct LoadingController {
    source: StoreId,
    destination: StoreId,
    manifest: Manifest,
    config: LoadingConfig,
    status: LoadingStatus,
    settlement_shortfall_streak: u32,
    /// Destination already satisfied the manifest at construction.
    preloaded: bool,
    skipped_optional: BTreeSet<ResourceId>,
    moved_amount: f64,
    moved_units: u64,
    calls: u32,
}

impl LoadingController {
    /// Bind a controller with the default [`LoadingConfig`].
    pub fn new(source: &Store, destination: &Store, manifest: Manifest) -> Result<Self, LoadingError> {
        Self::with_config(source, destination, manifest, LoadingConfig::default())
    }

    /// Bind a controller.
    ///
    /// Fails fast when source and destination are the same store, when a
    /// store was built over a different catalog, or when the destination
    /// lacks room for an outstanding required entry.
    pub fn with_config(
        source: &Store,
        destination: &Store,
        manifest: Manifest,
        config: LoadingConfig,
    ) -> Result<Self, LoadingError> {
        if source.id() == destination.id() {
            return Err(LoadingError::SameStore(source.id()));
        }
        if !same_catalog(source.catalog(), manifest.catalog()) {
            return Err(LoadingError::CatalogMismatch(StoreRole::Source));
        }
        if !same_catalog(destination.catalog(), manifest.catalog()) {
            return Err(LoadingError::CatalogMismatch(StoreRole::Destination));
        }
        let required_shortfalls: Vec<_> = manifest
            .check_capacity(destination)
            .into_iter()
            .filter(|s| !s.optional)
            .collect();
        if !required_shortfalls.is_empty() {
            return Err(LoadingError::InsufficientCapacity(required_shortfalls));
        }

        let preloaded = manifest.is_satisfied_by(destination)
            && optional_done_or_unreachable(&manifest, source, destination);
        log::debug!(
            "loading {} -> {}: {} entries, preloaded={}",
            source.owner(),
            destination.owner(),
            manifest.resource_ids().len(),
            preloaded
        );

        Ok(Self {
            source: source.id(),
            destination: destination.id(),
            manifest,
            config,
            status: LoadingStatus::NotStarted,
            settlement_shortfall_streak: 0,
            preloaded,
            skipped_optional: BTreeSet::new(),
            moved_amount: 0.0,
            moved_units: 0,
            calls: 0,
        })
    }

    /// Spend up to `effort` moving the manifest. Returns `true` once the
    /// load is complete; `false` while in progress or after failure.
    pub fn load(
        &mut self,
        source: &mut Store,
        destination: &mut Store,
        effort: f64,
    ) -> Result<bool, LoadingError> {
        match self.status {
            LoadingStatus::Completed => return Ok(true),
            LoadingStatus::Failed => return Ok(false),
            LoadingStatus::NotStarted | LoadingStatus::InProgress => {}
        }
        self.check_bound(source, destination)?;
        let mut budget = check_amount(effort)?;
        self.calls = self.calls.saturating_add(1);

        if self.status == LoadingStatus::NotStarted {
            self.status = LoadingStatus::InProgress;
            if self.preloaded {
                log::info!("{} already loaded, nothing to do", destination.owner());
                self.status = LoadingStatus::Completed;
                return Ok(true);
            }
        }

        let shortfall = self.load_required(source, destination, &mut budget)?;
        if self.manifest.is_satisfied_by(destination) {
            self.load_optional(source, destination, &mut budget)?;
        }

        if shortfall {
            self.settlement_shortfall_streak += 1;
            log::warn!(
                "{} lacks required resources for {} (streak {}/{})",
                source.owner(),
                destination.owner(),
                self.settlement_shortfall_streak,
                self.config.attempt_limit()
            );
        } else {
            self.settlement_shortfall_streak = 0;
        }

        if self.is_done(destination) {
            self.status = LoadingStatus::Completed;
            log::info!(
                "{} loaded from {} after {} calls",
                destination.owner(),
                source.owner(),
                self.calls
            );
            return Ok(true);
        }
        if self.settlement_shortfall_streak >= self.config.attempt_limit() {
            self.status = LoadingStatus::Failed;
            log::warn!(
                "loading {} from {} failed: required resources never arrived",
                destination.owner(),
                source.owner()
            );
            return Ok(false);
        }
        Ok(false)
    }

    /// Ambient loading with a background effort budget. Same effect as
    /// [`load`](Self::load).
    pub fn background_load(
        &mut self,
        source: &mut Store,
        destination: &mut Store,
        effort: f64,
    ) -> Result<bool, LoadingError> {
        self.load(source, destination, effort)
    }

    /// Walk required entries; returns whether any was missing at the source.
    fn load_required(
        &mut self,
        source: &mut Store,
        destination: &mut Store,
        budget: &mut f64,
    ) -> Result<bool, LoadingError> {
        let catalog = self.manifest.catalog().clone();
        let mut shortfall = false;

        let ids: Vec<ResourceId> = self.manifest.required_amounts().keys().copied().collect();
        for id in ids {
            let need = self.manifest.required_amount_outstanding(id, destination);
            if need <= 0.0 {
                continue;
            }
            if is_negligible(source.stored_amount(id)) {
                log::debug!("{} has no {} for {}", source.owner(), catalog.name(id), destination.owner());
                shortfall = true;
                continue;
            }
            self.move_amount(&catalog, source, destination, id, need, budget)?;
        }

        let ids: Vec<ResourceId> = self.manifest.required_units().keys().copied().collect();
        for id in ids {
            let need = self.manifest.required_units_outstanding(id, destination);
            if need == 0 {
                continue;
            }
            if source.stored_units(id) == 0 {
                log::debug!("{} has no {} for {}", source.owner(), catalog.name(id), destination.owner());
                shortfall = true;
                continue;
            }
            self.move_units(&catalog, source, destination, id, need, budget)?;
        }

        Ok(shortfall)
    }

    /// Walk optional entries, dropping the ones that cannot be served.
    fn load_optional(
        &mut self,
        source: &mut Store,
        destination: &mut Store,
        budget: &mut f64,
    ) -> Result<(), LoadingError> {
        let catalog = self.manifest.catalog().clone();

        let ids: Vec<ResourceId> = self.manifest.optional_amounts().keys().copied().collect();
        for id in ids {
            if self.skipped_optional.contains(&id) {
                continue;
            }
            let need = self.manifest.optional_amount_outstanding(id, destination);
            if need <= 0.0 {
                continue;
            }
            if is_negligible(source.stored_amount(id))
                || destination.remaining_capacity(id) <= 0.0
            {
                self.skip_optional(&catalog, id);
                continue;
            }
            self.move_amount(&catalog, source, destination, id, need, budget)?;
        }

        let ids: Vec<ResourceId> = self.manifest.optional_units().keys().copied().collect();
        for id in ids {
            if self.skipped_optional.contains(&id) {
                continue;
            }
            let need = self.manifest.optional_units_outstanding(id, destination);
            if need == 0 {
                continue;
            }
            if source.stored_units(id) == 0 || destination.remaining_unit_capacity(id) == 0 {
                self.skip_optional(&catalog, id);
                continue;
            }
            self.move_units(&catalog, source, destination, id, need, budget)?;
        }

        Ok(())
    }

    fn move_amount(
        &mut self,
        catalog: &ResourceCatalog,
        source: &mut Store,
        destination: &mut Store,
        id: ResourceId,
        need: f64,
        budget: &mut f64,
    ) -> Result<(), LoadingError> {
        if *budget <= 0.0 {
            log::trace!("no effort left for {}", catalog.name(id));
            return Ok(());
        }
        let moved = source.transfer_amount_to(destination, id, need.min(*budget))?;
        *budget = (*budget - moved).max(0.0);
        self.moved_amount += moved;
        log::debug!(
            "moved {:.3} kg of {} from {} to {}",
            moved,
            catalog.name(id),
            source.owner(),
            destination.owner()
        );
        Ok(())
    }

    fn move_units(
        &mut self,
        catalog: &ResourceCatalog,
        source: &mut Store,
        destination: &mut Store,
        id: ResourceId,
        need: u32,
        budget: &mut f64,
    ) -> Result<(), LoadingError> {
        let affordable = whole_units(*budget);
        if affordable == 0 {
            log::trace!("no whole unit of effort left for {}", catalog.name(id));
            return Ok(());
        }
        let moved = source.transfer_units_to(destination, id, need.min(affordable))?;
        *budget = (*budget - moved as f64).max(0.0);
        self.moved_units = self.moved_units.saturating_add(u64::from(moved));
        log::debug!(
            "moved {} x {} from {} to {}",
            moved,
            catalog.name(id),
            source.owner(),
            destination.owner()
        );
        Ok(())
    }

    fn skip_optional(&mut self, catalog: &ResourceCatalog, id: ResourceId) {
        log::info!("skipping optional {}: unavailable", catalog.name(id));
        self.skipped_optional.insert(id);
    }

    fn is_done(&self, destination: &Store) -> bool {
        if !self.manifest.is_satisfied_by(destination) {
            return false;
        }
        let amounts_done = self.manifest.optional_amounts().keys().all(|id| {
            self.skipped_optional.contains(id)
                || self.manifest.optional_amount_outstanding(*id, destination) <= 0.0
        });
        let units_done = self.manifest.optional_units().keys().all(|id| {
            self.skipped_optional.contains(id)
                || self.manifest.optional_units_outstanding(*id, destination) == 0
        });
        amounts_done && units_done
    }

    fn check_bound(&self, source: &Store, destination: &Store) -> Result<(), LoadingError> {
        if source.id() != self.source {
            return Err(LoadingError::StoreMismatch {
                role: StoreRole::Source,
                expected: self.source,
                found: source.id(),
            });
        }
        if destination.id() != self.destination {
            return Err(LoadingError::StoreMismatch {
                role: StoreRole::Destination,
                expected: self.destination,
                found: destination.id(),
            });
        }
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn is_completed(&self) -> bool {
        self.status == LoadingStatus::Completed
    }

    pub fn is_failure(&self) -> bool {
        self.status == LoadingStatus::Failed
    }

    pub fn status(&self) -> LoadingStatus {
        self.status
    }

    pub fn settlement_shortfall_streak(&self) -> u32 {
        self.settlement_shortfall_streak
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn config(&self) -> &LoadingConfig {
        &self.config
    }

    pub fn source_id(&self) -> StoreId {
        self.source
    }

    pub fn destination_id(&self) -> StoreId {
        self.destination
    }

    pub fn progress(&self, destination: &Store) -> LoadingProgress {
        LoadingProgress {
            status: self.status,
            calls: self.calls,
            settlement_shortfall_streak: self.settlement_shortfall_streak,
            max_settlement_attempts: self.config.attempt_limit(),
            outstanding: self.manifest.total_outstanding(destination),
            moved_amount: self.moved_amount,
            moved_units: self.moved_units,
            skipped_optional: self.skipped_optional.iter().copied().collect(),
        }
    }
}

fn same_catalog(a: &Arc<ResourceCatalog>, b: &Arc<ResourceCatalog>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Every optional entry is either met or cannot be served right now.
fn optional_done_or_unreachable(manifest: &Manifest, source: &Store, dest: &Store) -> bool {
    let amounts = manifest.optional_amounts().keys().all(|id| {
        manifest.optional_amount_outstanding(*id, dest) <= 0.0
            || is_negligible(source.stored_amount(*id))
            || dest.remaining_capacity(*id) <= 0.0
    });
    let units = manifest.optional_units().keys().all(|id| {
        manifest.optional_units_outstanding(*id, dest) == 0
            || source.stored_units(*id) == 0
            || dest.remaining_unit_capacity(*id) == 0
    });
    amounts && units
}
