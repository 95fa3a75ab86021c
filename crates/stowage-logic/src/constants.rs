//! Resource constants: well-known ids and float tolerances.
//!
//! Ids are plain `u32` values wrapped in [`ResourceId`]. By convention the
//! standard catalog places amount resources below 1000, item resources in
//! 1000..2000 and equipment types from 2000 upward, but nothing in the
//! engine relies on the ranges: kind is always looked up in the catalog.

use crate::resources::ResourceId;

/// Two amount quantities closer than this are considered equal.
pub const AMOUNT_EPSILON: f64 = 1e-9;

/// Id ranges used by the standard catalog.
pub mod ranges {
    pub const AMOUNT_START: u32 = 0;
    pub const ITEM_START: u32 = 1000;
    pub const EQUIPMENT_START: u32 = 2000;
}

/// Resource ids of the standard catalog.
pub mod resource_ids {
    use super::ResourceId;

    // Amount resources (kg)
    pub const OXYGEN: ResourceId = ResourceId(1);
    pub const WATER: ResourceId = ResourceId(2);
    pub const FOOD: ResourceId = ResourceId(3);
    pub const METHANE: ResourceId = ResourceId(4);
    pub const HYDROGEN: ResourceId = ResourceId(5);
    pub const ROCK_SAMPLES: ResourceId = ResourceId(6);
    pub const ICE: ResourceId = ResourceId(7);
    pub const REGOLITH: ResourceId = ResourceId(8);

    // Item resources (count)
    pub const WRENCH: ResourceId = ResourceId(1001);
    pub const SPARE_PARTS: ResourceId = ResourceId(1002);
    pub const MEDICAL_KIT: ResourceId = ResourceId(1003);
    pub const BATTERY: ResourceId = ResourceId(1004);
    pub const FIBERGLASS_PANEL: ResourceId = ResourceId(1005);

    // Equipment types (instances)
    pub const EVA_SUIT: ResourceId = ResourceId(2001);
    pub const SPECIMEN_BOX: ResourceId = ResourceId(2002);
    pub const GAS_CANISTER: ResourceId = ResourceId(2003);
    pub const BARREL: ResourceId = ResourceId(2004);
}
