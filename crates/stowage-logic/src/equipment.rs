//! Identity-bearing equipment instances.
//!
//! An EVA suit is not interchangeable with another EVA suit: each has its
//! own id and travels as itself. Stores keep equipment as a set of
//! instances and derive per-type counts by filtering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceId;

/// Unique id of one equipment instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(pub u64);

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "eq-{}", self.0)
    }
}

/// One piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    /// Equipment type, a catalog id of kind `Equipment`.
    pub kind: ResourceId,
}

impl Equipment {
    pub fn new(id: EquipmentId, kind: ResourceId) -> Self {
        Self { id, kind }
    }
}

/// Hands out sequential equipment ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentFactory {
    next_id: u64,
}

impl EquipmentFactory {
    /// Start numbering at `first_id`.
    pub fn starting_at(first_id: u64) -> Self {
        Self { next_id: first_id }
    }

    pub fn make(&mut self, kind: ResourceId) -> Equipment {
        let id = EquipmentId(self.next_id);
        self.next_id += 1;
        Equipment::new(id, kind)
    }

    /// Make `count` instances of one type with consecutive ids.
    pub fn make_many(&mut self, kind: ResourceId, count: u32) -> Vec<Equipment> {
        (0..count).map(|_| self.make(kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::resource_ids::{BARREL, EVA_SUIT};

    #[test]
    fn test_factory_ids_are_unique() {
        let mut factory = EquipmentFactory::starting_at(100);
        let suits = factory.make_many(EVA_SUIT, 3);
        let barrel = factory.make(BARREL);
        let ids: Vec<u64> = suits.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(barrel.id, EquipmentId(103));
        assert_eq!(barrel.kind, BARREL);
    }

    #[test]
    fn test_display() {
        assert_eq!(EquipmentId(7).to_string(), "eq-7");
    }
}
