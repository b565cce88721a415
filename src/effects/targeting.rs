//! Target selection.
//!
//! A [`TargetSelector`] names a shape (`self`, `single`, `area`, `cone`,
//! `line`, `all`) plus refinements. Selection runs in a fixed order:
//!
//! 1. gather candidates for the shape
//! 2. apply the filter (components, faction, predicate)
//! 3. drop the caster if `excludeSelf`
//! 4. drop previously visited ids if `excludePrevious`, then mark the
//!    survivors visited so later selections in the same run skip them
//! 5. truncate to `maxTargets`, keeping selection order
//!
//! Cones and lines use the same radius test as areas.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EntityId, World};
use crate::expr::{Expression, ExpressionEvaluator, WorldScope};

/// Radius used by spread shapes that don't specify one.
pub const DEFAULT_RADIUS: f64 = 10.0;

/// Selected target ids, in selection order.
pub type Targets = SmallVec<[EntityId; 8]>;

/// The shape of a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// The caster.
    #[serde(rename = "self")]
    Self_,
    /// The current target.
    Single,
    Area,
    Cone,
    Line,
    /// Every position-bearing entity.
    All,
}

/// Filters applied after gathering candidates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetFilter {
    /// Components every candidate must carry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    /// Candidate must belong to this faction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    /// Candidate must not belong to this faction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_faction: Option<String>,
    /// Custom predicate evaluated with `target` bound to the candidate.
    /// Evaluation failure excludes the candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Expression>,
}

/// How an effect picks its targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelector {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_targets: Option<usize>,
    #[serde(default)]
    pub exclude_self: bool,
    #[serde(default)]
    pub exclude_previous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<TargetFilter>,
}

impl TargetSelector {
    /// Create a selector of the given kind with no refinements.
    pub fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            radius: None,
            max_targets: None,
            exclude_self: false,
            exclude_previous: false,
            filter: None,
        }
    }

    /// Target the caster.
    pub fn caster() -> Self {
        Self::new(TargetKind::Self_)
    }

    /// Target the current target.
    pub fn single() -> Self {
        Self::new(TargetKind::Single)
    }

    /// Target everything within `radius` of the caster.
    pub fn area(radius: f64) -> Self {
        Self::new(TargetKind::Area).with_radius(radius)
    }

    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    #[must_use]
    pub fn with_max_targets(mut self, max: usize) -> Self {
        self.max_targets = Some(max);
        self
    }

    #[must_use]
    pub fn excluding_self(mut self) -> Self {
        self.exclude_self = true;
        self
    }

    #[must_use]
    pub fn excluding_previous(mut self) -> Self {
        self.exclude_previous = true;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: TargetFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Effective radius for spread shapes.
    #[must_use]
    pub fn effective_radius(&self) -> f64 {
        self.radius.unwrap_or(DEFAULT_RADIUS)
    }

    /// Run the selection algorithm.
    pub fn select(&self, ctx: &mut SelectionContext<'_>) -> Targets {
        let mut candidates = self.gather(ctx);

        if let Some(filter) = &self.filter {
            candidates.retain(|id| ctx.passes_filter(filter, *id));
        }

        if self.exclude_self {
            let caster = ctx.caster;
            candidates.retain(|id| *id != caster);
        }

        if self.exclude_previous {
            candidates.retain(|id| !ctx.visited.contains(id));
            ctx.visited.extend(candidates.iter().copied());
        }

        if let Some(max) = self.max_targets {
            candidates.truncate(max);
        }

        candidates
    }

    fn gather(&self, ctx: &SelectionContext<'_>) -> Targets {
        match self.kind {
            TargetKind::Self_ => present(ctx.world, ctx.caster),
            TargetKind::Single => present(ctx.world, ctx.target),
            TargetKind::Area | TargetKind::Cone | TargetKind::Line => {
                let Some(center) = ctx.world.get(ctx.caster).and_then(|e| e.position) else {
                    return Targets::new();
                };
                ctx.world
                    .within_radius(center, self.effective_radius())
                    .into_iter()
                    .collect()
            }
            TargetKind::All => ctx.world.with_component("position").map(|e| e.id).collect(),
        }
    }
}

fn present(world: &World, id: EntityId) -> Targets {
    if world.contains(id) {
        smallvec::smallvec![id]
    } else {
        Targets::new()
    }
}

/// Everything selection needs from the running interpreter.
pub struct SelectionContext<'a> {
    pub world: &'a World,
    pub caster: EntityId,
    /// The current target (what `single` selects).
    pub target: EntityId,
    pub tick: u64,
    pub depth: u32,
    /// Run-scoped set backing `excludePrevious`.
    pub visited: &'a mut FxHashSet<EntityId>,
    pub evaluator: &'a mut dyn ExpressionEvaluator,
}

impl SelectionContext<'_> {
    fn passes_filter(&mut self, filter: &TargetFilter, candidate: EntityId) -> bool {
        let Some(entity) = self.world.get(candidate) else {
            return false;
        };

        if !filter.components.iter().all(|c| entity.has_component(c)) {
            return false;
        }
        if let Some(faction) = &filter.faction {
            if entity.faction.as_deref() != Some(faction.as_str()) {
                return false;
            }
        }
        if let Some(excluded) = &filter.exclude_faction {
            if entity.faction.as_deref() == Some(excluded.as_str()) {
                return false;
            }
        }

        match &filter.predicate {
            Some(predicate) => {
                let scope = WorldScope {
                    world: self.world,
                    caster: self.caster,
                    target: candidate,
                    tick: self.tick,
                    depth: self.depth,
                };
                self.evaluator
                    .evaluate(predicate, &scope)
                    .map(|v| v.is_truthy())
                    .unwrap_or(false)
            }
            None => true,
        }
    }
}
