//! Resource catalog: ids, kinds and unit masses.
//!
//! The catalog is built once at start-up and shared read-only (usually as
//! an `Arc<ResourceCatalog>`) by every [`Store`](crate::store::Store) and
//! [`Manifest`](crate::manifest::Manifest). It answers two questions about
//! a resource id: is it an amount, an item or an equipment type, and how
//! much does one unit weigh.
//!
//! ```
//! use stowage_logic::constants::resource_ids::{EVA_SUIT, WATER};
//! use stowage_logic::resources::{ResourceCatalog, ResourceKind};
//!
//! let catalog = ResourceCatalog::standard();
//! assert_eq!(catalog.kind(WATER), Some(ResourceKind::Amount));
//! assert_eq!(catalog.kind(EVA_SUIT), Some(ResourceKind::Equipment));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::resource_ids::*;
use crate::error::CatalogError;

/// Opaque resource identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a resource is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Continuous mass quantity (kg), e.g. water.
    Amount,
    /// Interchangeable countable unit, e.g. a wrench.
    Item,
    /// Countable unit with individual identity, e.g. an EVA suit.
    Equipment,
}

impl ResourceKind {
    /// Whether quantities of this kind are whole units.
    pub fn is_discrete(self) -> bool {
        !matches!(self, ResourceKind::Amount)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Amount => write!(f, "amount"),
            ResourceKind::Item => write!(f, "item"),
            ResourceKind::Equipment => write!(f, "equipment"),
        }
    }
}

/// Catalog entry for a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub id: ResourceId,
    pub name: String,
    pub kind: ResourceKind,
    /// Mass of one unit in kg. For amount resources one unit is 1 kg.
    pub unit_mass: f64,
}

impl ResourceSpec {
    pub fn new(id: ResourceId, name: &str, kind: ResourceKind, unit_mass: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            unit_mass,
        }
    }
}

/// Read-only lookup from resource id to its spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<ResourceSpec>", try_from = "Vec<ResourceSpec>")]
pub struct ResourceCatalog {
    specs: BTreeMap<ResourceId, ResourceSpec>,
}

impl ResourceCatalog {
    /// Build a catalog, rejecting duplicate ids, blank names and bad masses.
    pub fn new(specs: Vec<ResourceSpec>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(spec.id));
            }
            if !spec.unit_mass.is_finite() || spec.unit_mass < 0.0 {
                return Err(CatalogError::InvalidMass {
                    id: spec.id,
                    mass: spec.unit_mass,
                });
            }
            if map.contains_key(&spec.id) {
                return Err(CatalogError::DuplicateId(spec.id));
            }
            map.insert(spec.id, spec);
        }
        Ok(Self { specs: map })
    }

    /// Parse a catalog from a JSON array of [`ResourceSpec`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let specs: Vec<ResourceSpec> = serde_json::from_str(json)?;
        Self::new(specs)
    }

    /// The built-in catalog. Mirrors `data/resource_catalog.json`.
    pub fn standard() -> Self {
        use ResourceKind::*;
        let specs = vec![
            ResourceSpec::new(OXYGEN, "oxygen", Amount, 1.0),
            ResourceSpec::new(WATER, "water", Amount, 1.0),
            ResourceSpec::new(FOOD, "food", Amount, 1.0),
            ResourceSpec::new(METHANE, "methane", Amount, 1.0),
            ResourceSpec::new(HYDROGEN, "hydrogen", Amount, 1.0),
            ResourceSpec::new(ROCK_SAMPLES, "rock samples", Amount, 1.0),
            ResourceSpec::new(ICE, "ice", Amount, 1.0),
            ResourceSpec::new(REGOLITH, "regolith", Amount, 1.0),
            ResourceSpec::new(WRENCH, "wrench", Item, 0.5),
            ResourceSpec::new(SPARE_PARTS, "spare parts", Item, 2.0),
            ResourceSpec::new(MEDICAL_KIT, "medical kit", Item, 1.5),
            ResourceSpec::new(BATTERY, "battery", Item, 4.0),
            ResourceSpec::new(FIBERGLASS_PANEL, "fiberglass panel", Item, 3.0),
            ResourceSpec::new(EVA_SUIT, "EVA suit", Equipment, 45.0),
            ResourceSpec::new(SPECIMEN_BOX, "specimen box", Equipment, 1.0),
            ResourceSpec::new(GAS_CANISTER, "gas canister", Equipment, 2.0),
            ResourceSpec::new(BARREL, "barrel", Equipment, 3.0),
        ];
        let specs = specs.into_iter().map(|s| (s.id, s)).collect();
        Self { specs }
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceSpec> {
        self.specs.get(&id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.specs.contains_key(&id)
    }

    pub fn kind(&self, id: ResourceId) -> Option<ResourceKind> {
        self.specs.get(&id).map(|s| s.kind)
    }

    /// Unit mass in kg, or `0.0` for an unknown id.
    pub fn unit_mass(&self, id: ResourceId) -> f64 {
        self.specs.get(&id).map_or(0.0, |s| s.unit_mass)
    }

    /// Display name, or the numeric id for an unknown resource.
    pub fn name(&self, id: ResourceId) -> String {
        self.specs
            .get(&id)
            .map_or_else(|| id.to_string(), |s| s.name.clone())
    }

    /// Find a resource by exact name.
    pub fn find_by_name(&self, name: &str) -> Option<&ResourceSpec> {
        self.specs.values().find(|s| s.name == name)
    }

    /// All specs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.specs.values()
    }

    /// All specs of one kind in ascending id order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceSpec> {
        self.specs.values().filter(move |s| s.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl From<ResourceCatalog> for Vec<ResourceSpec> {
    fn from(catalog: ResourceCatalog) -> Self {
        catalog.specs.into_values().collect()
    }
}

impl TryFrom<Vec<ResourceSpec>> for ResourceCatalog {
    type Error = CatalogError;

    fn try_from(specs: Vec<ResourceSpec>) -> Result<Self, Self::Error> {
        Self::new(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ranges;

    #[test]
    fn test_standard_catalog_kinds_follow_ranges() {
        let catalog = ResourceCatalog::standard();
        for spec in catalog.iter() {
            let n = spec.id.0;
            let expected = if (ranges::AMOUNT_START..ranges::ITEM_START).contains(&n) {
                ResourceKind::Amount
            } else if (ranges::ITEM_START..ranges::EQUIPMENT_START).contains(&n) {
                ResourceKind::Item
            } else {
                ResourceKind::Equipment
            };
            assert_eq!(spec.kind, expected, "{} has unexpected kind", spec.name);
        }
    }

    #[test]
    fn test_standard_catalog_validates() {
        let specs: Vec<ResourceSpec> = ResourceCatalog::standard().into();
        let rebuilt = ResourceCatalog::new(specs).unwrap();
        assert_eq!(rebuilt, ResourceCatalog::standard());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let specs = vec![
            ResourceSpec::new(WATER, "water", ResourceKind::Amount, 1.0),
            ResourceSpec::new(WATER, "more water", ResourceKind::Amount, 1.0),
        ];
        assert!(matches!(
            ResourceCatalog::new(specs),
            Err(CatalogError::DuplicateId(id)) if id == WATER
        ));
    }

    #[test]
    fn test_negative_mass_rejected() {
        let specs = vec![ResourceSpec::new(WRENCH, "wrench", ResourceKind::Item, -1.0)];
        assert!(matches!(
            ResourceCatalog::new(specs),
            Err(CatalogError::InvalidMass { .. })
        ));
    }

    #[test]
    fn test_blank_name_rejected() {
        let specs = vec![ResourceSpec::new(WRENCH, "  ", ResourceKind::Item, 1.0)];
        assert!(matches!(
            ResourceCatalog::new(specs),
            Err(CatalogError::EmptyName(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": 2, "name": "water", "kind": "amount", "unit_mass": 1.0},
            {"id": 2001, "name": "EVA suit", "kind": "equipment", "unit_mass": 45.0}
        ]"#;
        let catalog = ResourceCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.kind(EVA_SUIT), Some(ResourceKind::Equipment));
        assert_eq!(catalog.unit_mass(EVA_SUIT), 45.0);
        assert_eq!(catalog.find_by_name("water").map(|s| s.id), Some(WATER));
    }

    #[test]
    fn test_from_json_bad_syntax() {
        assert!(matches!(
            ResourceCatalog::from_json("not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn test_unknown_id_lookups() {
        let catalog = ResourceCatalog::standard();
        let unknown = ResourceId(9999);
        assert!(!catalog.contains(unknown));
        assert_eq!(catalog.kind(unknown), None);
        assert_eq!(catalog.unit_mass(unknown), 0.0);
        assert_eq!(catalog.name(unknown), "#9999");
    }

    #[test]
    fn test_of_kind_filters() {
        let catalog = ResourceCatalog::standard();
        assert!(catalog
            .of_kind(ResourceKind::Item)
            .all(|s| s.kind.is_discrete()));
        assert_eq!(catalog.of_kind(ResourceKind::Equipment).count(), 4);
    }
}
