//! Fault types.
//!
//! Only caller misuse is an error here. Running short at the source or out
//! of room at the destination is normal simulation state and is reported
//! through return values (shortfall, excess, units moved) instead.

use thiserror::Error;

use crate::equipment::EquipmentId;
use crate::manifest::CapacityShortfall;
use crate::resources::{ResourceId, ResourceKind};
use crate::store::StoreId;

/// A caller-supplied quantity that can never be valid.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum QuantityError {
    #[error("quantity must not be negative, got {0}")]
    Negative(f64),
    #[error("quantity must be finite, got {0}")]
    NonFinite(f64),
}

/// Problems building a [`ResourceCatalog`](crate::resources::ResourceCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("resource {0} is listed twice")]
    DuplicateId(ResourceId),
    #[error("resource {id} has invalid unit mass {mass}")]
    InvalidMass { id: ResourceId, mass: f64 },
    #[error("resource {0} has an empty name")]
    EmptyName(ResourceId),
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Misuse of a [`Store`](crate::store::Store).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("resource {0} is not in the catalog")]
    UnknownResource(ResourceId),
    #[error("resource {id} is {found}, operation expects {expected}")]
    KindMismatch {
        id: ResourceId,
        expected: ResourceKind,
        found: ResourceKind,
    },
    #[error("equipment {0} is already in this store")]
    DuplicateEquipment(EquipmentId),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// Problems building a [`Manifest`](crate::manifest::Manifest).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifestError {
    #[error("manifest entry {0} is not in the catalog")]
    UnknownResource(ResourceId),
    #[error("manifest lists {id} ({found}) as {expected}")]
    KindMismatch {
        id: ResourceId,
        expected: &'static str,
        found: ResourceKind,
    },
    #[error("manifest entry {id}: {source}")]
    Quantity {
        id: ResourceId,
        #[source]
        source: QuantityError,
    },
}

/// Which side of a load a store plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Source,
    Destination,
}

impl std::fmt::Display for StoreRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreRole::Source => write!(f, "source"),
            StoreRole::Destination => write!(f, "destination"),
        }
    }
}

/// Misuse of a [`LoadingController`](crate::loading::LoadingController).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadingError {
    #[error("source and destination are the same store ({0})")]
    SameStore(StoreId),
    #[error("{role} store mismatch: controller is bound to {expected}, got {found}")]
    StoreMismatch {
        role: StoreRole,
        expected: StoreId,
        found: StoreId,
    },
    #[error("{0} store uses a different resource catalog than the manifest")]
    CatalogMismatch(StoreRole),
    #[error("destination lacks capacity for {} required entries", .0.len())]
    InsufficientCapacity(Vec<CapacityShortfall>),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid effort budget: {0}")]
    Budget(#[from] QuantityError),
}
