//! Fixed vocabularies effect programs may name.
//!
//! Anything outside these lists is rejected before it can touch the
//! world, regardless of who authored the effect.

/// Every recognized `op` tag, in declaration order.
pub const OPERATION_NAMES: [&str; 19] = [
    "modify_stat",
    "set_stat",
    "apply_status",
    "remove_status",
    "deal_damage",
    "heal",
    "teleport",
    "push",
    "pull",
    "spawn_entity",
    "spawn_item",
    "transform_entity",
    "transform_material",
    "emit_event",
    "chain_effect",
    "trigger_effect",
    "conditional",
    "repeat",
    "delay",
];

/// Operations that count as "advanced" composition.
pub const ADVANCED_OPERATIONS: [&str; 5] =
    ["chain_effect", "trigger_effect", "conditional", "repeat", "delay"];

pub const ALLOWED_STATS: &[&str] = &[
    "strength",
    "dexterity",
    "constitution",
    "intelligence",
    "wisdom",
    "charisma",
    "mana",
    "stamina",
    "speed",
    "armor",
    "resistance",
    "luck",
    "perception",
    "willpower",
];

pub const ALLOWED_STATUSES: &[&str] = &[
    "burning",
    "frozen",
    "slowed",
    "stunned",
    "poisoned",
    "bleeding",
    "blessed",
    "cursed",
    "hasted",
    "invisible",
    "shielded",
    "silenced",
    "rooted",
    "weakened",
    "empowered",
    "confused",
    "regenerating",
    "charmed",
    "feared",
    "sleeping",
];

pub const ALLOWED_ARCHETYPES: &[&str] = &[
    "wolf",
    "bear",
    "raven",
    "cat",
    "frog",
    "sheep",
    "serpent",
    "tree",
    "skeleton",
    "zombie",
    "spirit",
    "wisp",
    "slime",
    "elemental",
    "stone_golem",
    "imp",
];

pub const ALLOWED_MATERIALS: &[&str] = &[
    "stone", "wood", "iron", "gold", "silver", "glass", "ice", "water", "sand", "crystal", "salt",
    "ash",
];

#[must_use]
pub fn is_operation_name(name: &str) -> bool {
    OPERATION_NAMES.contains(&name)
}

#[must_use]
pub fn is_allowed_stat(name: &str) -> bool {
    ALLOWED_STATS.contains(&name)
}

#[must_use]
pub fn is_allowed_status(name: &str) -> bool {
    ALLOWED_STATUSES.contains(&name)
}

#[must_use]
pub fn is_allowed_archetype(name: &str) -> bool {
    ALLOWED_ARCHETYPES.contains(&name)
}

#[must_use]
pub fn is_allowed_material(name: &str) -> bool {
    ALLOWED_MATERIALS.contains(&name)
}
