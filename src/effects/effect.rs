//! Effect program definitions.
//!
//! An [`EffectExpression`] is a small declarative program: optional
//! preconditions, a target selector, an ordered list of operations and
//! timing metadata. Operations form a closed set; `conditional`,
//! `repeat` and `delay` embed nested operation lists, while
//! `chain_effect` and `trigger_effect` reference other registered effects
//! by id.
//!
//! ```
//! use effect_forge::effects::{EffectExpression, EffectOperation};
//!
//! let effect = EffectExpression::from_json_str(r#"{
//!     "target": { "type": "single" },
//!     "operations": [ { "op": "deal_damage", "damageType": "fire", "amount": 100 } ],
//!     "timing": { "type": "immediate" }
//! }"#).unwrap();
//!
//! assert!(matches!(effect.operations[0], EffectOperation::DealDamage { .. }));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expr::Expression;

use super::targeting::{TargetKind, TargetSelector};

/// A declarative effect program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectExpression {
    /// Registry key used by `chain_effect` / `trigger_effect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Preconditions; all must hold for the effect to run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    pub target: TargetSelector,

    #[serde(default)]
    pub operations: Vec<EffectOperation>,

    pub timing: Timing,
}

/// Failure to decode an effect from JSON.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Effect could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
}

impl EffectExpression {
    /// Create an effect with no operations.
    pub fn new(target: TargetSelector, timing: Timing) -> Self {
        Self {
            id: None,
            name: None,
            conditions: Vec::new(),
            target,
            operations: Vec::new(),
            timing,
        }
    }

    /// Decode from a JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, DecodeError> {
        Ok(Self::deserialize(value)?)
    }

    /// Decode from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the registry id (builder pattern).
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a precondition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append an operation (builder pattern).
    #[must_use]
    pub fn with_operation(mut self, operation: EffectOperation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Every operation in the tree, depth-first, including nested bodies.
    pub fn walk_operations(&self) -> Vec<&EffectOperation> {
        let mut out = Vec::new();
        collect(&self.operations, &mut out);
        out
    }
}

fn collect<'a>(operations: &'a [EffectOperation], out: &mut Vec<&'a EffectOperation>) {
    for op in operations {
        out.push(op);
        for body in op.bodies() {
            collect(body, out);
        }
    }
}

/// When the effect takes hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingKind {
    #[default]
    Immediate,
    Delayed,
    Periodic,
    Triggered,
}

/// Timing metadata. The interpreter does not act on it; it informs
/// scoring and spell synthesis.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Timing {
    #[serde(rename = "type")]
    pub kind: TimingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Timing {
    pub fn immediate() -> Self {
        Self::default()
    }

    pub fn of(kind: TimingKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

/// A precondition or branch condition.
///
/// Four shapes are accepted: `{"predicate": expr}`, a raw binary node
/// (`{"op", "left", "right"}`), a function call (`{"fn", "args"}`), or
/// any other bare expression. A shape that is none of these is kept
/// verbatim as `Opaque` and always passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Predicate { predicate: Expression },
    Expr(Expression),
    Opaque(serde_json::Value),
}

impl Condition {
    /// The expression to evaluate, or `None` for opaque conditions.
    #[must_use]
    pub fn expression(&self) -> Option<&Expression> {
        match self {
            Self::Predicate { predicate } => Some(predicate),
            Self::Expr(expr) => Some(expr),
            Self::Opaque(_) => None,
        }
    }
}

impl From<Expression> for Condition {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

/// An `{x, y}` pair of expressions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: Expression,
    pub y: Expression,
}

impl Location {
    pub fn new(x: impl Into<Expression>, y: impl Into<Expression>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// One atomic step of an effect program.
///
/// ## Entity state
/// `ModifyStat`, `SetStat`, `ApplyStatus`, `RemoveStatus`, `DealDamage`, `Heal`
///
/// ## Movement
/// `Teleport`, `Push`, `Pull`
///
/// ## Creation and change
/// `SpawnEntity`, `SpawnItem`, `TransformEntity`, `TransformMaterial`, `EmitEvent`
///
/// ## Composition
/// `ChainEffect`, `TriggerEffect`, `Conditional`, `Repeat`, `Delay`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EffectOperation {
    ModifyStat {
        stat: String,
        amount: Expression,
    },
    SetStat {
        stat: String,
        value: Expression,
    },
    ApplyStatus {
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<Expression>,
    },
    RemoveStatus {
        status: String,
    },
    DealDamage {
        amount: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        damage_type: Option<String>,
    },
    Heal {
        amount: Expression,
    },
    Teleport {
        location: Location,
    },
    /// Move the target away from the caster (or along `direction`).
    Push {
        distance: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<Location>,
    },
    /// Move the target toward the caster (or toward `toward`).
    Pull {
        distance: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        toward: Option<Location>,
    },
    SpawnEntity {
        entity_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<Expression>,
    },
    SpawnItem {
        item_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<Expression>,
    },
    TransformEntity {
        to: String,
    },
    TransformMaterial {
        material: String,
    },
    EmitEvent {
        event_type: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        payload: BTreeMap<String, serde_json::Value>,
    },
    ChainEffect {
        effect_id: String,
        new_target: TargetSelector,
    },
    TriggerEffect {
        effect_id: String,
    },
    Conditional {
        condition: Condition,
        then: Vec<EffectOperation>,
        #[serde(default, rename = "else", skip_serializing_if = "Vec::is_empty")]
        otherwise: Vec<EffectOperation>,
    },
    Repeat {
        times: Expression,
        operations: Vec<EffectOperation>,
    },
    Delay {
        ticks: Expression,
        operations: Vec<EffectOperation>,
    },
}

impl EffectOperation {
    /// Deal damage of an optional type.
    pub fn damage(amount: impl Into<Expression>) -> Self {
        Self::DealDamage {
            amount: amount.into(),
            damage_type: None,
        }
    }

    /// Heal the target.
    pub fn heal(amount: impl Into<Expression>) -> Self {
        Self::Heal {
            amount: amount.into(),
        }
    }

    /// Apply a status for a duration.
    pub fn status(status: impl Into<String>, duration: impl Into<Expression>) -> Self {
        Self::ApplyStatus {
            status: status.into(),
            duration: Some(duration.into()),
        }
    }

    /// Add to a stat.
    pub fn modify_stat(stat: impl Into<String>, amount: impl Into<Expression>) -> Self {
        Self::ModifyStat {
            stat: stat.into(),
            amount: amount.into(),
        }
    }

    /// Spawn `count` entities of an archetype.
    pub fn spawn(entity_type: impl Into<String>, count: impl Into<Expression>) -> Self {
        Self::SpawnEntity {
            entity_type: entity_type.into(),
            count: Some(count.into()),
        }
    }

    /// Chain a registered effect onto newly selected targets.
    pub fn chain(effect_id: impl Into<String>, new_target: TargetSelector) -> Self {
        Self::ChainEffect {
            effect_id: effect_id.into(),
            new_target,
        }
    }

    /// Repeat a body.
    pub fn repeat(times: impl Into<Expression>, operations: Vec<EffectOperation>) -> Self {
        Self::Repeat {
            times: times.into(),
            operations,
        }
    }

    /// The `op` tag as written on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModifyStat { .. } => "modify_stat",
            Self::SetStat { .. } => "set_stat",
            Self::ApplyStatus { .. } => "apply_status",
            Self::RemoveStatus { .. } => "remove_status",
            Self::DealDamage { .. } => "deal_damage",
            Self::Heal { .. } => "heal",
            Self::Teleport { .. } => "teleport",
            Self::Push { .. } => "push",
            Self::Pull { .. } => "pull",
            Self::SpawnEntity { .. } => "spawn_entity",
            Self::SpawnItem { .. } => "spawn_item",
            Self::TransformEntity { .. } => "transform_entity",
            Self::TransformMaterial { .. } => "transform_material",
            Self::EmitEvent { .. } => "emit_event",
            Self::ChainEffect { .. } => "chain_effect",
            Self::TriggerEffect { .. } => "trigger_effect",
            Self::Conditional { .. } => "conditional",
            Self::Repeat { .. } => "repeat",
            Self::Delay { .. } => "delay",
        }
    }

    /// Composition operations (chain, trigger, conditional, repeat, delay).
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(
            self,
            Self::ChainEffect { .. }
                | Self::TriggerEffect { .. }
                | Self::Conditional { .. }
                | Self::Repeat { .. }
                | Self::Delay { .. }
        )
    }

    /// Nested operation bodies, if any.
    #[must_use]
    pub fn bodies(&self) -> Vec<&[EffectOperation]> {
        match self {
            Self::Conditional { then, otherwise, .. } => vec![then.as_slice(), otherwise.as_slice()],
            Self::Repeat { operations, .. } | Self::Delay { operations, .. } => {
                vec![operations.as_slice()]
            }
            _ => Vec::new(),
        }
    }
}

impl TargetSelector {
    /// Whether this selector reaches beyond a single entity.
    #[must_use]
    pub fn is_spread(&self) -> bool {
        matches!(self.kind, TargetKind::Area | TargetKind::Cone | TargetKind::Line)
    }
}
