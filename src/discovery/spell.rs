//! Spell synthesis and the spell registry port.
//!
//! A blessed effect becomes a [`SpellDefinition`]. Technique, form and the
//! casting numbers are inferred from the operation list and target shape.
//!
//! ## Casting numbers
//!
//! | Field | Rule |
//! |---|---|
//! | mana cost | `10 + 5 per operation + damage / 10`, ×1.5 for spread targets |
//! | cast time | `1 + 0.5 per operation` seconds |
//! | range | target radius; 10 for single, 0 for self |

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blessing::BlessingDecision;
use crate::effects::{EffectExpression, EffectOperation, TargetKind, TimingKind};
use crate::evaluation::conservative_value;

/// Range of a single-target spell.
pub const SINGLE_TARGET_RANGE: f64 = 10.0;

/// Range of an `all` spell.
pub const GLOBAL_RANGE: f64 = 100.0;

/// What the spell does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Create,
    Destroy,
    Transform,
    Control,
    Enhance,
    Perceive,
}

/// What the spell works on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
    Fire,
    Water,
    Earth,
    Air,
    Body,
    Mind,
    Spirit,
    Space,
    Time,
}

/// A playable spell built from a blessed effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paradigm: Option<String>,
    pub technique: Technique,
    pub form: Form,
    pub mana_cost: u32,
    pub cast_time: f64,
    pub range: f64,
    pub effect: EffectExpression,
    pub creator_id: String,
    pub creator_name: String,
    pub blessed_by: String,
    pub created_at: DateTime<Utc>,
}

impl SpellDefinition {
    /// Build a spell from a blessed effect.
    ///
    /// Every spell gets a freshly minted id. The effect's own id is kept on
    /// [`SpellDefinition::effect`] and may collide across creators.
    pub fn synthesize(
        effect: EffectExpression,
        description: &str,
        paradigm: Option<&str>,
        creator_id: &str,
        creator_name: &str,
        decision: &BlessingDecision,
    ) -> Self {
        let id = format!("spell_{}", Uuid::new_v4().simple());
        let name = effect
            .name
            .clone()
            .unwrap_or_else(|| title_from(description));

        Self {
            id,
            name,
            description: description.to_string(),
            paradigm: paradigm.map(str::to_string),
            technique: infer_technique(&effect),
            form: infer_form(&effect),
            mana_cost: mana_cost(&effect),
            cast_time: cast_time(&effect),
            range: range(&effect),
            effect,
            creator_id: creator_id.to_string(),
            creator_name: creator_name.to_string(),
            blessed_by: decision.deity.clone(),
            created_at: decision.timestamp,
        }
    }
}

fn title_from(description: &str) -> String {
    let title: String = description.split_whitespace().take(4).collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        "Unnamed Spell".to_string()
    } else {
        title
    }
}

/// The technique of the first operation that has one.
///
/// Events and composition operations carry no technique of their own.
/// An effect made only of those is a perception spell.
#[must_use]
pub fn infer_technique(effect: &EffectExpression) -> Technique {
    effect
        .walk_operations()
        .into_iter()
        .find_map(|op| match op {
            EffectOperation::DealDamage { .. } => Some(Technique::Destroy),
            EffectOperation::SpawnEntity { .. } | EffectOperation::SpawnItem { .. } => {
                Some(Technique::Create)
            }
            EffectOperation::TransformEntity { .. } | EffectOperation::TransformMaterial { .. } => {
                Some(Technique::Transform)
            }
            EffectOperation::Teleport { .. }
            | EffectOperation::Push { .. }
            | EffectOperation::Pull { .. }
            | EffectOperation::ApplyStatus { .. }
            | EffectOperation::RemoveStatus { .. } => Some(Technique::Control),
            EffectOperation::ModifyStat { .. }
            | EffectOperation::SetStat { .. }
            | EffectOperation::Heal { .. } => Some(Technique::Enhance),
            _ => None,
        })
        .unwrap_or(Technique::Perceive)
}

fn form_for_damage(damage_type: &str) -> Option<Form> {
    match damage_type.to_ascii_lowercase().as_str() {
        "fire" | "heat" => Some(Form::Fire),
        "cold" | "ice" | "frost" | "water" => Some(Form::Water),
        "earth" | "acid" | "stone" => Some(Form::Earth),
        "lightning" | "air" | "thunder" => Some(Form::Air),
        "poison" | "physical" | "necrotic" => Some(Form::Body),
        "psychic" => Some(Form::Mind),
        "radiant" | "holy" | "arcane" => Some(Form::Spirit),
        _ => None,
    }
}

/// The element the effect works through.
///
/// A typed damage operation decides it. Otherwise movement means space,
/// deferred timing means time, and healing or stat work means body.
#[must_use]
pub fn infer_form(effect: &EffectExpression) -> Form {
    let ops = effect.walk_operations();

    let by_damage = ops.iter().find_map(|op| match op {
        EffectOperation::DealDamage {
            damage_type: Some(kind),
            ..
        } => form_for_damage(kind),
        _ => None,
    });
    if let Some(form) = by_damage {
        return form;
    }

    let any = |pred: fn(&EffectOperation) -> bool| ops.iter().any(|op| pred(op));

    if any(|op| {
        matches!(
            op,
            EffectOperation::Teleport { .. } | EffectOperation::Push { .. } | EffectOperation::Pull { .. }
        )
    }) {
        Form::Space
    } else if any(|op| matches!(op, EffectOperation::Delay { .. }))
        || matches!(effect.timing.kind, TimingKind::Delayed | TimingKind::Periodic)
    {
        Form::Time
    } else if any(|op| matches!(op, EffectOperation::TransformMaterial { .. })) {
        Form::Earth
    } else if any(|op| {
        matches!(
            op,
            EffectOperation::Heal { .. } | EffectOperation::ModifyStat { .. } | EffectOperation::SetStat { .. }
        )
    }) {
        Form::Body
    } else {
        Form::Spirit
    }
}

/// Mana cost from operation count, static damage and target shape.
#[must_use]
pub fn mana_cost(effect: &EffectExpression) -> u32 {
    let ops = effect.walk_operations();
    let damage: f64 = ops
        .iter()
        .filter_map(|op| match op {
            EffectOperation::DealDamage { amount, .. } => Some(conservative_value(amount)),
            _ => None,
        })
        .filter(|d| d.is_finite() && *d > 0.0)
        .sum();

    let mut cost = 10.0 + 5.0 * ops.len() as f64 + (damage / 10.0).round();
    if effect.target.is_spread() {
        cost *= 1.5;
    }
    cost.round().min(f64::from(u32::MAX)) as u32
}

/// Seconds to cast.
#[must_use]
pub fn cast_time(effect: &EffectExpression) -> f64 {
    1.0 + 0.5 * effect.walk_operations().len() as f64
}

/// Casting range in world units.
#[must_use]
pub fn range(effect: &EffectExpression) -> f64 {
    match effect.target.kind {
        TargetKind::Self_ => 0.0,
        TargetKind::Single => SINGLE_TARGET_RANGE,
        TargetKind::All => GLOBAL_RANGE,
        TargetKind::Area | TargetKind::Cone | TargetKind::Line => effect.target.effective_radius(),
    }
}

/// Where blessed spells go.
pub trait SpellRegistry: Send + Sync {
    /// Register a spell under its id.
    fn register(&self, spell: SpellDefinition);

    fn get(&self, id: &str) -> Option<SpellDefinition>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry backed by an in-process map.
#[derive(Debug, Default)]
pub struct InMemorySpellRegistry {
    spells: RwLock<FxHashMap<String, SpellDefinition>>,
}

impl InMemorySpellRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All registered spells, sorted by id.
    pub fn all(&self) -> Vec<SpellDefinition> {
        let spells = self.spells.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<_> = spells.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

impl SpellRegistry for InMemorySpellRegistry {
    fn register(&self, spell: SpellDefinition) {
        self.spells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spell.id.clone(), spell);
    }

    fn get(&self, id: &str) -> Option<SpellDefinition> {
        self.spells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn len(&self) -> usize {
        self.spells.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
