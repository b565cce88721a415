//! Variable resolution for expressions.
//!
//! Expressions only ever *read* through a [`VariableScope`]. The
//! interpreter exposes the live world through [`WorldScope`]:
//!
//! | Path | Meaning |
//! |---|---|
//! | `caster.health`, `target.health` | normalized health |
//! | `caster.position.x` / `.y` | coordinates |
//! | `caster.id` | raw entity id |
//! | `caster.status.<name>` | status active (boolean) |
//! | `caster.<stat>` | any stat |
//! | `world.tick`, `world.entityCount` | world facts |
//! | `context.tick`, `context.depth` | execution facts |

use rustc_hash::FxHashMap;

use crate::core::{Entity, EntityId, World};

use super::Value;

/// Read-only variable lookup.
pub trait VariableScope {
    /// Resolve a dotted path, or `None` if it is undefined.
    fn resolve(&self, path: &str) -> Option<Value>;
}

/// A scope backed by a flat map. Handy for tests and static contexts.
#[derive(Clone, Debug, Default)]
pub struct MapScope {
    values: FxHashMap<String, Value>,
}

impl MapScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable (builder pattern).
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }
}

impl VariableScope for MapScope {
    fn resolve(&self, path: &str) -> Option<Value> {
        self.values.get(path).copied()
    }
}

/// A scope over the live world for one (caster, target) pair.
pub struct WorldScope<'a> {
    pub world: &'a World,
    pub caster: EntityId,
    pub target: EntityId,
    pub tick: u64,
    pub depth: u32,
}

impl WorldScope<'_> {
    fn entity_field(entity: &Entity, field: &str) -> Option<Value> {
        match field {
            "id" => Some(Value::Number(f64::from(entity.id.raw()))),
            "health" => entity.health.map(Value::Number),
            "position.x" => entity.position.map(|p| Value::Number(p.x)),
            "position.y" => entity.position.map(|p| Value::Number(p.y)),
            _ => {
                if let Some(status) = field.strip_prefix("status.") {
                    return Some(Value::Bool(entity.has_status(status)));
                }
                entity.stats.get(field).copied().map(Value::Number)
            }
        }
    }
}

impl VariableScope for WorldScope<'_> {
    fn resolve(&self, path: &str) -> Option<Value> {
        let (root, field) = path.split_once('.')?;
        match root {
            "caster" => Self::entity_field(self.world.get(self.caster)?, field),
            "target" => Self::entity_field(self.world.get(self.target)?, field),
            "world" => match field {
                "tick" => Some(Value::Number(self.world.tick() as f64)),
                "entityCount" => Some(Value::Number(self.world.len() as f64)),
                _ => None,
            },
            "context" => match field {
                "tick" => Some(Value::Number(self.tick as f64)),
                "depth" => Some(Value::Number(f64::from(self.depth))),
                _ => None,
            },
            _ => None,
        }
    }
}
