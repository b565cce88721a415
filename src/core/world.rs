//! Entity/component store the interpreter mutates.
//!
//! The world is deliberately small: a persistent ordered map from
//! `EntityId` to [`Entity`], where an entity carries the handful of
//! components effect operations read and write. Persistence (`im`) makes
//! `snapshot()` O(1): validation builds its sandbox once and dry-runs every
//! candidate against a fresh snapshot of it.
//!
//! ## Components
//!
//! | Name | Field | Notes |
//! |---|---|---|
//! | `position` | `position` | 2D coordinates |
//! | `health` | `health` | normalized to `[0, 1]` |
//! | `stats` | `stats` | named numeric attributes |
//! | `statuses` | `statuses` | active status effects |
//! | `archetype` | `archetype` | creature/item kind |
//! | `material` | `material` | what the entity is made of |
//! | `faction` | `faction` | allegiance |
//!
//! Anything else is a free-form tag.

use im::OrdMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::EntityId;

/// Damage and healing amounts are divided by this before touching
/// normalized health.
pub const HEALTH_SCALE: f64 = 100.0;

/// Largest coordinate magnitude a teleport may land on.
pub const WORLD_BOUND: f64 = 10_000.0;

/// A point in the 2D simulation plane.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Both coordinates lie within `[-bound, bound]`.
    #[must_use]
    pub fn within_bounds(self, bound: f64) -> bool {
        self.x.abs() <= bound && self.y.abs() <= bound
    }
}

/// An active status effect on an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Remaining duration in ticks.
    pub duration: f64,
    /// Tick the status was applied on.
    pub applied_at: u64,
}

/// A simulated entity and its components.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned by the world on insertion.
    pub id: EntityId,
    pub position: Option<Position>,
    /// Normalized health in `[0, 1]`.
    pub health: Option<f64>,
    pub stats: FxHashMap<String, f64>,
    pub statuses: FxHashMap<String, StatusEffect>,
    pub archetype: Option<String>,
    pub material: Option<String>,
    pub faction: Option<String>,
    pub tags: SmallVec<[String; 4]>,
}

impl Entity {
    /// Create an entity with no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position (builder pattern).
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// Set normalized health (builder pattern).
    #[must_use]
    pub fn with_health(mut self, health: f64) -> Self {
        self.health = Some(health.clamp(0.0, 1.0));
        self
    }

    /// Set a stat value (builder pattern).
    #[must_use]
    pub fn with_stat(mut self, name: impl Into<String>, value: f64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }

    /// Set the archetype (builder pattern).
    #[must_use]
    pub fn with_archetype(mut self, archetype: impl Into<String>) -> Self {
        self.archetype = Some(archetype.into());
        self
    }

    /// Set the faction (builder pattern).
    #[must_use]
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }

    /// Add a free-form tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check whether the entity carries a named component or tag.
    #[must_use]
    pub fn has_component(&self, name: &str) -> bool {
        match name {
            "position" => self.position.is_some(),
            "health" => self.health.is_some(),
            "stats" => !self.stats.is_empty(),
            "statuses" => !self.statuses.is_empty(),
            "archetype" => self.archetype.is_some(),
            "material" => self.material.is_some(),
            "faction" => self.faction.is_some(),
            other => self.tags.iter().any(|t| t == other),
        }
    }

    /// Check whether a status is currently active.
    #[must_use]
    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.contains_key(status)
    }
}

/// The live entity store.
///
/// Cloning (or [`World::snapshot`]) shares structure with the original,
/// so throwaway executions cost nothing until they write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    entities: OrdMap<EntityId, Entity>,
    next_id: EntityId,
    tick: u64,
}

impl World {
    /// Create an empty world. The first entity receives id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: OrdMap::new(),
            next_id: EntityId(1),
            tick: 0,
        }
    }

    /// Insert an entity, assigning it a fresh id.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id = id.next();
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over all entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities carrying the named component, in ascending id order.
    pub fn with_component<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.entities.values().filter(move |e| e.has_component(component))
    }

    /// Ids of position-bearing entities within `radius` of `center`.
    #[must_use]
    pub fn within_radius(&self, center: Position, radius: f64) -> Vec<EntityId> {
        self.with_component("position")
            .filter(|e| {
                e.position
                    .is_some_and(|p| p.distance_to(center) <= radius)
            })
            .map(|e| e.id)
            .collect()
    }

    /// Current simulation tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance or rewind the simulation tick.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Cheap structural copy for throwaway executions.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
