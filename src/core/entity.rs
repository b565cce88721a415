//! Entity identification.
//!
//! Every simulated object (creature, item, spawned summon) has a unique
//! `EntityId`. Ids are allocated by the [`World`](super::World) in
//! ascending order and never reused within one world.
//!
//! ```
//! use effect_forge::core::EntityId;
//!
//! let caster = EntityId::new(1);
//! assert_eq!(caster.raw(), 1);
//! assert_eq!(format!("{}", caster), "Entity(1)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for any world entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The id following this one, used by the world allocator.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_raw_value() {
        let mut ids = vec![EntityId(5), EntityId(1), EntityId(3)];
        ids.sort();
        assert_eq!(ids, vec![EntityId(1), EntityId(3), EntityId(5)]);
    }

    #[test]
    fn test_next() {
        assert_eq!(EntityId::new(7).next(), EntityId(8));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EntityId(42)), "Entity(42)");
    }

    #[test]
    fn test_serialization() {
        let id = EntityId(123);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "123");
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
