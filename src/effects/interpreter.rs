//! The bounded effect interpreter.
//!
//! [`EffectInterpreter::execute`] walks an effect tree against one
//! (caster, target, tick) context and mutates the world in place. Every
//! run gets fresh counters, threaded through the walk in a private
//! `RunState`; nothing run-scoped lives on the interpreter itself, so one
//! instance can be reused sequentially without a reset step.
//!
//! ## Bounds
//!
//! | Bound | On violation |
//! |---|---|
//! | `max_operations` | critical error |
//! | `max_depth` | critical error |
//! | `max_chain_depth` | critical error |
//! | `timeout_ms` | critical error |
//! | `max_entities_affected` | operation silently skipped |
//! | `max_damage_per_effect` | damage clamped |
//! | `max_spawns_per_effect` | spawn count clamped |
//!
//! ## Chains
//!
//! `chain_effect` loops are bounded only by the depth and chain-depth
//! limits. The visited set exists for `excludePrevious` filtering and is
//! never consulted for cycle detection.
//!
//! ```
//! use effect_forge::core::{Entity, InterpreterLimits, World};
//! use effect_forge::effects::{EffectExpression, EffectInterpreter, EffectOperation,
//!     ExecutionContext, TargetSelector, Timing};
//!
//! let mut world = World::new();
//! let caster = world.spawn(Entity::new().at(0.0, 0.0).with_health(1.0));
//! let target = world.spawn(Entity::new().at(3.0, 0.0).with_health(1.0));
//!
//! let effect = EffectExpression::new(TargetSelector::single(), Timing::immediate())
//!     .with_operation(EffectOperation::damage(40));
//!
//! let mut interpreter = EffectInterpreter::new(InterpreterLimits::default());
//! let result = interpreter
//!     .execute(&effect, ExecutionContext::new(caster, target, 0), &mut world)
//!     .unwrap();
//!
//! assert!(result.success);
//! assert_eq!(result.damage_dealt, 40.0);
//! let health = world.get(target).unwrap().health.unwrap();
//! assert!((health - 0.6).abs() < 1e-9);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::core::{
    Entity, EntityId, EvaluatorLimits, InterpreterLimits, Position, StatusEffect, World,
    HEALTH_SCALE, WORLD_BOUND,
};
use crate::expr::{ExprError, Expression, ExpressionEvaluator, SafeEvaluator, Value, WorldScope};
use crate::security;

use super::targeting::{SelectionContext, Targets};
use super::vocab;
use super::{
    Condition, DeferredOperation, EffectExpression, EffectOperation, EffectResult, EmittedEvent,
    InterpreterError, Location, Severity, TargetSelector, MAX_DELAY_TICKS,
};

/// Reason reported when preconditions fail.
pub const CONDITIONS_NOT_MET: &str = "conditions_not_met";

/// Duration given to `apply_status` when none is specified.
pub const DEFAULT_STATUS_DURATION: f64 = 10.0;

/// Payload strings starting with one of these are read as variables.
const VARIABLE_PREFIXES: [&str; 4] = ["caster.", "target.", "world.", "context."];

/// Who is acting on whom, and when.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    pub caster: EntityId,
    pub target: EntityId,
    pub tick: u64,
}

impl ExecutionContext {
    pub const fn new(caster: EntityId, target: EntityId, tick: u64) -> Self {
        Self {
            caster,
            target,
            tick,
        }
    }

    fn retarget(self, target: EntityId) -> Self {
        Self { target, ..self }
    }
}

/// Counters and accumulators for one run.
struct RunState {
    operations: u32,
    chain_count: u32,
    affected: FxHashSet<EntityId>,
    affected_order: Vec<EntityId>,
    visited: FxHashSet<EntityId>,
    damage_dealt: f64,
    healing_done: f64,
    spawned: u32,
    spawned_entities: Vec<EntityId>,
    events: Vec<EmittedEvent>,
    deferred: Vec<DeferredOperation>,
    started: Instant,
}

impl RunState {
    fn new() -> Self {
        Self {
            operations: 0,
            chain_count: 0,
            affected: FxHashSet::default(),
            affected_order: Vec::new(),
            visited: FxHashSet::default(),
            damage_dealt: 0.0,
            healing_done: 0.0,
            spawned: 0,
            spawned_entities: Vec::new(),
            events: Vec::new(),
            deferred: Vec::new(),
            started: Instant::now(),
        }
    }

    fn touch(&mut self, id: EntityId) {
        if self.affected.insert(id) {
            self.affected_order.push(id);
        }
    }

    fn into_result(self, error: Option<String>) -> EffectResult {
        EffectResult {
            success: error.is_none(),
            reason: None,
            error,
            affected_entities: self.affected_order,
            damage_dealt: self.damage_dealt,
            healing_done: self.healing_done,
            spawned: self.spawned,
            spawned_entities: self.spawned_entities,
            events: self.events,
            chain_count: self.chain_count,
            operations_executed: self.operations,
            deferred: self.deferred,
        }
    }
}

/// Executes effect trees within hard resource bounds.
///
/// Not meant for concurrent use: give each in-flight execution its own
/// instance (they are cheap) or serialize access.
pub struct EffectInterpreter {
    limits: InterpreterLimits,
    evaluator: Box<dyn ExpressionEvaluator>,
    registry: FxHashMap<String, Arc<EffectExpression>>,
}

impl EffectInterpreter {
    /// Create an interpreter backed by a default [`SafeEvaluator`].
    pub fn new(limits: InterpreterLimits) -> Self {
        Self::with_evaluator(limits, Box::new(SafeEvaluator::new(EvaluatorLimits::default())))
    }

    /// Create an interpreter with a custom expression evaluator.
    pub fn with_evaluator(limits: InterpreterLimits, evaluator: Box<dyn ExpressionEvaluator>) -> Self {
        Self {
            limits,
            evaluator,
            registry: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &InterpreterLimits {
        &self.limits
    }

    /// Make an effect reachable from `chain_effect` / `trigger_effect`.
    ///
    /// Returns `false` (and registers nothing) if the effect has no id.
    pub fn register_effect(&mut self, effect: EffectExpression) -> bool {
        match effect.id.clone() {
            Some(id) => {
                self.registry.insert(id, Arc::new(effect));
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_registered(&self, effect_id: &str) -> bool {
        self.registry.contains_key(effect_id)
    }

    /// Execute an effect.
    ///
    /// Returns `Err` only for critical failures. Recoverable failures end
    /// the run early and are reported in [`EffectResult::error`] together
    /// with whatever already happened.
    pub fn execute(
        &mut self,
        effect: &EffectExpression,
        ctx: ExecutionContext,
        world: &mut World,
    ) -> Result<EffectResult, InterpreterError> {
        self.evaluator.reset();
        let mut run = RunState::new();

        if let Some(id) = &effect.id {
            self.registry.insert(id.clone(), Arc::new(effect.clone()));
        }

        let outcome = self.run_effect(effect, ctx, world, &mut run);
        Self::finish(outcome, run)
    }

    /// Run a body captured by `delay` with fresh counters.
    pub fn execute_deferred(
        &mut self,
        deferred: &DeferredOperation,
        tick: u64,
        world: &mut World,
    ) -> Result<EffectResult, InterpreterError> {
        self.evaluator.reset();
        let mut run = RunState::new();
        let ctx = ExecutionContext::new(deferred.caster, deferred.target, tick);

        let outcome = self
            .execute_operations(&deferred.operations, world, ctx, deferred.depth, &mut run)
            .map(|()| true);
        Self::finish(outcome, run)
    }

    fn finish(outcome: Result<bool, InterpreterError>, run: RunState) -> Result<EffectResult, InterpreterError> {
        match outcome {
            Ok(true) => Ok(run.into_result(None)),
            Ok(false) => Ok(EffectResult::skipped(CONDITIONS_NOT_MET)),
            Err(err) => match err.severity() {
                Severity::Critical => {
                    warn!(error = %err, operations = run.operations, "effect execution aborted");
                    Err(err)
                }
                Severity::Recoverable => {
                    debug!(error = %err, operations = run.operations, "effect execution stopped");
                    Ok(run.into_result(Some(err.to_string())))
                }
            },
        }
    }

    fn run_effect(
        &mut self,
        effect: &EffectExpression,
        ctx: ExecutionContext,
        world: &mut World,
        run: &mut RunState,
    ) -> Result<bool, InterpreterError> {
        if !self.conditions_hold(&effect.conditions, world, ctx, 0)? {
            debug!(caster = %ctx.caster, target = %ctx.target, "preconditions not met");
            return Ok(false);
        }

        let targets = self.select(&effect.target, world, ctx, 0, run);
        for target in targets {
            self.execute_operations(&effect.operations, world, ctx.retarget(target), 0, run)?;
        }
        Ok(true)
    }

    fn select(
        &mut self,
        selector: &TargetSelector,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
        run: &mut RunState,
    ) -> Targets {
        let mut selection = SelectionContext {
            world,
            caster: ctx.caster,
            target: ctx.target,
            tick: ctx.tick,
            depth,
            visited: &mut run.visited,
            evaluator: self.evaluator.as_mut(),
        };
        selector.select(&mut selection)
    }

    fn execute_operations(
        &mut self,
        operations: &[EffectOperation],
        world: &mut World,
        ctx: ExecutionContext,
        depth: u32,
        run: &mut RunState,
    ) -> Result<(), InterpreterError> {
        if depth > self.limits.max_depth {
            return Err(InterpreterError::DepthLimit {
                limit: self.limits.max_depth,
            });
        }
        for operation in operations {
            self.execute_operation(operation, world, ctx, depth, run)?;
        }
        Ok(())
    }

    fn execute_operation(
        &mut self,
        operation: &EffectOperation,
        world: &mut World,
        ctx: ExecutionContext,
        depth: u32,
        run: &mut RunState,
    ) -> Result<(), InterpreterError> {
        run.operations += 1;
        if run.operations > self.limits.max_operations {
            return Err(InterpreterError::OperationLimit {
                limit: self.limits.max_operations,
            });
        }
        self.check_deadline(run)?;

        if !run.affected.contains(&ctx.target) && run.affected.len() >= self.limits.max_entities_affected {
            debug!(op = operation.name(), target = %ctx.target, "entity cap reached, skipping");
            return Ok(());
        }

        debug!(op = operation.name(), target = %ctx.target, depth, "executing operation");

        match operation {
            EffectOperation::ModifyStat { stat, amount } => {
                validate_stat(stat)?;
                let amount = self.number(amount, world, ctx, depth)?;
                *entity_mut(world, ctx.target)?.stats.entry(stat.clone()).or_insert(0.0) += amount;
                run.touch(ctx.target);
            }

            EffectOperation::SetStat { stat, value } => {
                validate_stat(stat)?;
                let value = self.number(value, world, ctx, depth)?;
                entity_mut(world, ctx.target)?.stats.insert(stat.clone(), value);
                run.touch(ctx.target);
            }

            EffectOperation::ApplyStatus { status, duration } => {
                validate_status(status)?;
                let duration = match duration {
                    Some(expr) => self.number(expr, world, ctx, depth)?,
                    None => DEFAULT_STATUS_DURATION,
                };
                entity_mut(world, ctx.target)?.statuses.insert(
                    status.clone(),
                    StatusEffect {
                        duration,
                        applied_at: ctx.tick,
                    },
                );
                run.touch(ctx.target);
            }

            EffectOperation::RemoveStatus { status } => {
                validate_status(status)?;
                entity_mut(world, ctx.target)?.statuses.remove(status);
                run.touch(ctx.target);
            }

            EffectOperation::DealDamage { amount, .. } => {
                let amount = self.number(amount, world, ctx, depth)?;
                if amount < 0.0 {
                    self.apply_healing(-amount, world, ctx.target, run)?;
                } else {
                    self.apply_damage(amount, world, ctx.target, run)?;
                }
            }

            EffectOperation::Heal { amount } => {
                let amount = self.number(amount, world, ctx, depth)?;
                if amount < 0.0 {
                    self.apply_damage(-amount, world, ctx.target, run)?;
                } else {
                    self.apply_healing(amount, world, ctx.target, run)?;
                }
            }

            EffectOperation::Teleport { location } => {
                let destination = self.location(location, world, ctx, depth)?;
                if !destination.is_finite() || !destination.within_bounds(WORLD_BOUND) {
                    return Err(InterpreterError::InvalidDestination {
                        x: destination.x,
                        y: destination.y,
                    });
                }
                entity_mut(world, ctx.target)?.position = Some(destination);
                run.touch(ctx.target);
            }

            EffectOperation::Push { distance, direction } => {
                let distance = self.number(distance, world, ctx, depth)?;
                let origin = position_of(world, ctx.target)?;
                let (dx, dy) = match direction {
                    Some(direction) => {
                        let heading = self.location(direction, world, ctx, depth)?;
                        (heading.x, heading.y)
                    }
                    None => {
                        let from = position_of(world, ctx.caster)?;
                        (origin.x - from.x, origin.y - from.y)
                    }
                };
                let length = dx.hypot(dy);
                if length > 0.0 {
                    let scale = distance / length;
                    move_to(world, ctx.target, Position::new(origin.x + dx * scale, origin.y + dy * scale))?;
                }
                run.touch(ctx.target);
            }

            EffectOperation::Pull { distance, toward } => {
                let distance = self.number(distance, world, ctx, depth)?.max(0.0);
                let origin = position_of(world, ctx.target)?;
                let point = match toward {
                    Some(toward) => self.location(toward, world, ctx, depth)?,
                    None => position_of(world, ctx.caster)?,
                };
                let gap = origin.distance_to(point);
                if gap > 0.0 {
                    let fraction = distance.min(gap) / gap;
                    move_to(
                        world,
                        ctx.target,
                        Position::new(
                            origin.x + (point.x - origin.x) * fraction,
                            origin.y + (point.y - origin.y) * fraction,
                        ),
                    )?;
                }
                run.touch(ctx.target);
            }

            EffectOperation::SpawnEntity { entity_type, count } => {
                security::check_identifier("entityType", entity_type)?;
                if !vocab::is_allowed_archetype(entity_type) {
                    return Err(InterpreterError::InvalidEntityType(entity_type.clone()));
                }
                let count = self.spawn_count(count.as_ref(), world, ctx, depth)?;
                let template = Entity::new().with_archetype(entity_type.clone());
                self.spawn(template, count, world, ctx.target, run)?;
                run.touch(ctx.target);
            }

            EffectOperation::SpawnItem { item_type, count } => {
                security::check_identifier("itemType", item_type)?;
                let count = self.spawn_count(count.as_ref(), world, ctx, depth)?;
                let template = Entity::new().with_archetype(item_type.clone()).with_tag("item");
                self.spawn(template, count, world, ctx.target, run)?;
                run.touch(ctx.target);
            }

            EffectOperation::TransformEntity { to } => {
                security::check_identifier("to", to)?;
                if !vocab::is_allowed_archetype(to) {
                    return Err(InterpreterError::InvalidEntityType(to.clone()));
                }
                entity_mut(world, ctx.target)?.archetype = Some(to.clone());
                run.touch(ctx.target);
            }

            EffectOperation::TransformMaterial { material } => {
                security::check_identifier("material", material)?;
                if !vocab::is_allowed_material(material) {
                    return Err(InterpreterError::InvalidMaterial(material.clone()));
                }
                entity_mut(world, ctx.target)?.material = Some(material.clone());
                run.touch(ctx.target);
            }

            EffectOperation::EmitEvent { event_type, payload } => {
                let payload = self.resolve_payload(payload, world, ctx, depth);
                run.events.push(EmittedEvent {
                    event_type: event_type.clone(),
                    source: ctx.caster,
                    target: ctx.target,
                    tick: ctx.tick,
                    payload,
                });
            }

            EffectOperation::ChainEffect { effect_id, new_target } => {
                self.chain(effect_id, new_target, world, ctx, depth, run)?;
            }

            EffectOperation::TriggerEffect { effect_id } => {
                if let Some(triggered) = self.lookup(effect_id) {
                    self.execute_operations(&triggered.operations, world, ctx, depth + 1, run)?;
                }
            }

            EffectOperation::Conditional { condition, then, otherwise } => {
                let branch = if self.condition_holds(condition, world, ctx, depth)? {
                    then
                } else {
                    otherwise
                };
                self.execute_operations(branch, world, ctx, depth + 1, run)?;
            }

            EffectOperation::Repeat { times, operations } => {
                let times = self.count("repeat", times, world, ctx, depth)?;
                if operations.is_empty() {
                    return Ok(());
                }
                for _ in 0..times {
                    self.execute_operations(operations, world, ctx, depth + 1, run)?;
                }
            }

            EffectOperation::Delay { ticks, operations } => {
                let ticks = self
                    .number(ticks, world, ctx, depth)?
                    .clamp(0.0, MAX_DELAY_TICKS as f64)
                    .floor() as u64;
                run.deferred.push(DeferredOperation {
                    ticks,
                    due_tick: ctx.tick.saturating_add(ticks),
                    operations: operations.clone(),
                    caster: ctx.caster,
                    target: ctx.target,
                    depth: depth + 1,
                });
            }
        }

        Ok(())
    }

    fn chain(
        &mut self,
        effect_id: &str,
        selector: &TargetSelector,
        world: &mut World,
        ctx: ExecutionContext,
        depth: u32,
        run: &mut RunState,
    ) -> Result<(), InterpreterError> {
        let Some(chained) = self.lookup(effect_id) else {
            return Ok(());
        };

        let targets = self.select(selector, world, ctx, depth, run);
        for target in targets {
            run.chain_count += 1;
            if run.chain_count > self.limits.max_chain_depth {
                return Err(InterpreterError::ChainDepthLimit {
                    limit: self.limits.max_chain_depth,
                });
            }

            let next = ctx.retarget(target);
            if !self.conditions_hold(&chained.conditions, world, next, depth + 1)? {
                continue;
            }
            self.execute_operations(&chained.operations, world, next, depth + 1, run)?;
        }
        Ok(())
    }

    fn lookup(&self, effect_id: &str) -> Option<Arc<EffectExpression>> {
        let found = self.registry.get(effect_id).cloned();
        if found.is_none() {
            debug!(effect_id, "unknown effect id, skipping");
        }
        found
    }

    fn apply_damage(
        &self,
        amount: f64,
        world: &mut World,
        target: EntityId,
        run: &mut RunState,
    ) -> Result<(), InterpreterError> {
        let remaining = (self.limits.max_damage_per_effect - run.damage_dealt).max(0.0);
        let applied = amount.min(remaining);

        let entity = entity_mut(world, target)?;
        let Some(health) = entity.health.as_mut() else {
            debug!(target = %target, "target has no health, damage ignored");
            return Ok(());
        };
        *health = (*health - applied / HEALTH_SCALE).max(0.0);
        run.damage_dealt += applied;
        run.touch(target);
        Ok(())
    }

    fn apply_healing(
        &self,
        amount: f64,
        world: &mut World,
        target: EntityId,
        run: &mut RunState,
    ) -> Result<(), InterpreterError> {
        let entity = entity_mut(world, target)?;
        let Some(health) = entity.health.as_mut() else {
            debug!(target = %target, "target has no health, healing ignored");
            return Ok(());
        };
        *health = (*health + amount / HEALTH_SCALE).clamp(0.0, 1.0);
        run.healing_done += amount;
        run.touch(target);
        Ok(())
    }

    fn spawn(
        &self,
        template: Entity,
        requested: u32,
        world: &mut World,
        at: EntityId,
        run: &mut RunState,
    ) -> Result<(), InterpreterError> {
        let available = self.limits.max_spawns_per_effect.saturating_sub(run.spawned);
        let count = requested.min(available);
        if count < requested {
            debug!(requested, spawned = count, "spawn cap reached");
        }

        let position = world
            .get(at)
            .ok_or(InterpreterError::EntityNotFound(at))?
            .position;
        for _ in 0..count {
            let mut entity = template.clone().with_health(1.0);
            entity.position = position;
            run.spawned_entities.push(world.spawn(entity));
        }
        run.spawned += count;
        Ok(())
    }

    fn resolve_payload(
        &mut self,
        payload: &BTreeMap<String, serde_json::Value>,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> BTreeMap<String, serde_json::Value> {
        payload
            .iter()
            .map(|(key, raw)| (key.clone(), self.resolve_field(raw, world, ctx, depth)))
            .collect()
    }

    /// Never fails: variable strings fall back to the literal, other
    /// expressions fall back to null.
    fn resolve_field(
        &mut self,
        raw: &serde_json::Value,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> serde_json::Value {
        match raw {
            serde_json::Value::String(text) if VARIABLE_PREFIXES.iter().any(|p| text.starts_with(p)) => self
                .evaluate(&Expression::Variable(text.clone()), world, ctx, depth)
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| raw.clone()),
            serde_json::Value::String(_) | serde_json::Value::Number(_) => raw.clone(),
            other => serde_json::from_value::<Expression>(other.clone())
                .ok()
                .and_then(|expr| self.evaluate(&expr, world, ctx, depth).ok())
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
        }
    }

    fn conditions_hold(
        &mut self,
        conditions: &[Condition],
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<bool, InterpreterError> {
        for condition in conditions {
            if !self.condition_holds(condition, world, ctx, depth)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Opaque conditions pass.
    fn condition_holds(
        &mut self,
        condition: &Condition,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<bool, InterpreterError> {
        match condition.expression() {
            Some(expr) => Ok(self.evaluate(expr, world, ctx, depth)?.is_truthy()),
            None => Ok(true),
        }
    }

    fn evaluate(
        &mut self,
        expr: &Expression,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<Value, ExprError> {
        let scope = WorldScope {
            world,
            caster: ctx.caster,
            target: ctx.target,
            tick: ctx.tick,
            depth,
        };
        self.evaluator.evaluate(expr, &scope)
    }

    fn number(
        &mut self,
        expr: &Expression,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<f64, InterpreterError> {
        Ok(self.evaluate(expr, world, ctx, depth)?.as_number())
    }

    fn location(
        &mut self,
        location: &Location,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<Position, InterpreterError> {
        let x = self.number(&location.x, world, ctx, depth)?;
        let y = self.number(&location.y, world, ctx, depth)?;
        Ok(Position::new(x, y))
    }

    /// A non-negative whole count. Negative values are a hard failure.
    fn count(
        &mut self,
        operation: &'static str,
        expr: &Expression,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<u32, InterpreterError> {
        let count = self.number(expr, world, ctx, depth)?;
        if count < 0.0 {
            return Err(InterpreterError::NegativeCount { operation, count });
        }
        Ok(count.floor().min(f64::from(u32::MAX)) as u32)
    }

    fn spawn_count(
        &mut self,
        expr: Option<&Expression>,
        world: &World,
        ctx: ExecutionContext,
        depth: u32,
    ) -> Result<u32, InterpreterError> {
        match expr {
            Some(expr) => self.count("spawn", expr, world, ctx, depth),
            None => Ok(1),
        }
    }

    fn check_deadline(&self, run: &RunState) -> Result<(), InterpreterError> {
        let Some(limit) = self.limits.timeout() else {
            return Ok(());
        };
        let elapsed = run.started.elapsed();
        if elapsed > limit {
            return Err(InterpreterError::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
                limit_ms: limit.as_millis() as u64,
            });
        }
        Ok(())
    }
}

impl Default for EffectInterpreter {
    fn default() -> Self {
        Self::new(InterpreterLimits::default())
    }
}

fn validate_stat(stat: &str) -> Result<(), InterpreterError> {
    security::check_identifier("stat", stat)?;
    if !vocab::is_allowed_stat(stat) {
        return Err(InterpreterError::InvalidStat(stat.to_string()));
    }
    Ok(())
}

fn validate_status(status: &str) -> Result<(), InterpreterError> {
    security::check_identifier("status", status)?;
    if !vocab::is_allowed_status(status) {
        return Err(InterpreterError::InvalidStatus(status.to_string()));
    }
    Ok(())
}

fn entity_mut(world: &mut World, id: EntityId) -> Result<&mut Entity, InterpreterError> {
    world.get_mut(id).ok_or(InterpreterError::EntityNotFound(id))
}

fn position_of(world: &World, id: EntityId) -> Result<Position, InterpreterError> {
    world
        .get(id)
        .ok_or(InterpreterError::EntityNotFound(id))?
        .position
        .ok_or(InterpreterError::MissingComponent {
            entity: id,
            component: "position",
        })
}

/// Forced movement stops at the world edge.
fn move_to(world: &mut World, id: EntityId, destination: Position) -> Result<(), InterpreterError> {
    let clamped = Position::new(
        destination.x.clamp(-WORLD_BOUND, WORLD_BOUND),
        destination.y.clamp(-WORLD_BOUND, WORLD_BOUND),
    );
    entity_mut(world, id)?.position = Some(clamped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{TargetKind, Timing};
    use serde_json::json;
    use std::time::Duration;

    struct Arena {
        world: World,
        caster: EntityId,
        target: EntityId,
    }

    fn arena() -> Arena {
        let mut world = World::new();
        let caster = world.spawn(Entity::new().at(0.0, 0.0).with_health(1.0).with_stat("intelligence", 12.0));
        let target = world.spawn(Entity::new().at(4.0, 0.0).with_health(1.0));
        Arena { world, caster, target }
    }

    fn health_of(arena: &Arena) -> f64 {
        arena.world.get(arena.target).unwrap().health.unwrap()
    }

    fn single(operations: Vec<EffectOperation>) -> EffectExpression {
        operations
            .into_iter()
            .fold(EffectExpression::new(TargetSelector::single(), Timing::immediate()), |e, op| {
                e.with_operation(op)
            })
    }

    fn run(arena: &mut Arena, effect: &EffectExpression, limits: InterpreterLimits) -> Result<EffectResult, InterpreterError> {
        let mut interpreter = EffectInterpreter::new(limits);
        interpreter.execute(effect, ExecutionContext::new(arena.caster, arena.target, 7), &mut arena.world)
    }

    #[test]
    fn test_conditions_not_met_is_noop() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::damage(10)])
            .with_condition(Expression::binary(">", Expression::var("caster.intelligence"), 50.into()).into());

        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert!(!result.success);
        assert_eq!(result.reason.as_deref(), Some(CONDITIONS_NOT_MET));
        assert_eq!(arena.world.get(arena.target).unwrap().health, Some(1.0));
    }

    #[test]
    fn test_damage_is_clamped_to_cap() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::damage(60), EffectOperation::damage(60)]);

        let result = run(&mut arena, &effect, InterpreterLimits::default().with_max_damage(100.0)).unwrap();
        assert_eq!(result.damage_dealt, 100.0);
        assert!(health_of(&arena) < 1e-9);
    }

    #[test]
    fn test_negative_damage_heals() {
        let mut arena = arena();
        arena.world.get_mut(arena.target).unwrap().health = Some(0.5);
        let effect = single(vec![EffectOperation::damage(-20)]);

        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert_eq!(result.damage_dealt, 0.0);
        assert_eq!(result.healing_done, 20.0);
        assert!((health_of(&arena) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_negative_heal_is_capped_damage() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::heal(-500)]);

        let result = run(&mut arena, &effect, InterpreterLimits::default().with_max_damage(1.0)).unwrap();
        assert_eq!(result.healing_done, 0.0);
        assert_eq!(result.damage_dealt, 1.0);
        assert!((health_of(&arena) - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_heal_clamps_health_but_counts_fully() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::heal(500)]);

        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert_eq!(result.healing_done, 500.0);
        assert_eq!(arena.world.get(arena.target).unwrap().health, Some(1.0));
    }

    #[test]
    fn test_invalid_stat_is_critical() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::modify_stat("__proto__", 1)]);
        let err = run(&mut arena, &effect, InterpreterLimits::default()).unwrap_err();
        assert!(matches!(err, InterpreterError::Security(_)));

        let effect = single(vec![EffectOperation::modify_stat("godhood", 1)]);
        let err = run(&mut arena, &effect, InterpreterLimits::default()).unwrap_err();
        assert_eq!(err, InterpreterError::InvalidStat("godhood".into()));
    }

    #[test]
    fn test_stat_modification_reads_caster() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::modify_stat(
            "strength",
            Expression::binary("*", Expression::var("caster.intelligence"), 2.into()),
        )]);
        run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert_eq!(arena.world.get(arena.target).unwrap().stats.get("strength"), Some(&24.0));
    }

    #[test]
    fn test_teleport_out_of_bounds() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::Teleport {
            location: Location::new(WORLD_BOUND * 2.0, 0.0),
        }]);
        let err = run(&mut arena, &effect, InterpreterLimits::default()).unwrap_err();
        assert!(matches!(err, InterpreterError::InvalidDestination { .. }));
        assert!(err.is_critical());
    }

    #[test]
    fn test_push_moves_away_from_caster() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::Push {
            distance: 3.into(),
            direction: None,
        }]);
        run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert_eq!(arena.world.get(arena.target).unwrap().position, Some(Position::new(7.0, 0.0)));
    }

    #[test]
    fn test_pull_does_not_overshoot() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::Pull {
            distance: 100.into(),
            toward: None,
        }]);
        run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert_eq!(arena.world.get(arena.target).unwrap().position, Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_spawn_cap_is_cumulative() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::spawn("wolf", 3), EffectOperation::spawn("wolf", 3)]);

        let result = run(&mut arena, &effect, InterpreterLimits::default().with_max_spawns(4)).unwrap();
        assert_eq!(result.spawned, 4);
        assert_eq!(result.spawned_entities.len(), 4);
        assert_eq!(arena.world.len(), 6);
    }

    #[test]
    fn test_negative_spawn_count_is_critical() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::spawn("wolf", -1)]);
        let err = run(&mut arena, &effect, InterpreterLimits::default()).unwrap_err();
        assert!(matches!(err, InterpreterError::NegativeCount { operation: "spawn", .. }));
    }

    #[test]
    fn test_operation_limit() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::repeat(10, vec![EffectOperation::heal(1)])]);

        // 1 repeat + 10 heals
        assert!(run(&mut arena, &effect, InterpreterLimits::default().with_max_operations(11)).is_ok());
        let err = run(&mut arena, &effect, InterpreterLimits::default().with_max_operations(10)).unwrap_err();
        assert_eq!(err, InterpreterError::OperationLimit { limit: 10 });
    }

    #[test]
    fn test_depth_limit() {
        let mut arena = arena();
        let nested = EffectOperation::repeat(1, vec![EffectOperation::repeat(1, vec![EffectOperation::heal(1)])]);
        let effect = single(vec![nested]);

        assert!(run(&mut arena, &effect, InterpreterLimits::default().with_max_depth(2)).is_ok());
        let err = run(&mut arena, &effect, InterpreterLimits::default().with_max_depth(1)).unwrap_err();
        assert_eq!(err, InterpreterError::DepthLimit { limit: 1 });
    }

    #[test]
    fn test_entity_cap_skips_silently() {
        let mut world = World::new();
        let caster = world.spawn(Entity::new().at(0.0, 0.0).with_health(1.0));
        for i in 1..=4 {
            world.spawn(Entity::new().at(f64::from(i), 0.0).with_health(1.0));
        }
        let effect = EffectExpression::new(TargetSelector::area(10.0), Timing::immediate())
            .with_operation(EffectOperation::damage(10));

        let mut interpreter = EffectInterpreter::new(InterpreterLimits::default().with_max_entities(2));
        let result = interpreter
            .execute(&effect, ExecutionContext::new(caster, caster, 0), &mut world)
            .unwrap();

        assert!(result.success);
        assert_eq!(result.affected_entities.len(), 2);
        assert_eq!(result.damage_dealt, 20.0);
    }

    #[test]
    fn test_chain_depth_limit() {
        let mut world = World::new();
        let caster = world.spawn(Entity::new().at(0.0, 0.0).with_health(1.0));
        for i in 1..=3 {
            world.spawn(Entity::new().at(f64::from(i), 0.0).with_health(1.0));
        }

        let mut interpreter = EffectInterpreter::new(InterpreterLimits::default().with_max_chain_depth(2));
        interpreter.register_effect(
            EffectExpression::new(TargetSelector::single(), Timing::immediate())
                .with_id("spark")
                .with_operation(EffectOperation::damage(5)),
        );

        let effect = EffectExpression::new(TargetSelector::caster(), Timing::immediate())
            .with_operation(EffectOperation::chain("spark", TargetSelector::area(5.0).excluding_self()));

        let err = interpreter
            .execute(&effect, ExecutionContext::new(caster, caster, 0), &mut world)
            .unwrap_err();
        assert!(err.to_string().contains("Maximum chain depth limit exceeded"));
    }

    #[test]
    fn test_unknown_chain_target_is_silent() {
        let mut arena = arena();
        let effect = single(vec![
            EffectOperation::chain("nowhere", TargetSelector::single()),
            EffectOperation::TriggerEffect {
                effect_id: "nothing".into(),
            },
        ]);
        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.chain_count, 0);
    }

    #[test]
    fn test_self_registration_allows_trigger() {
        let mut arena = arena();
        let effect = single(vec![
            EffectOperation::damage(10),
            EffectOperation::Conditional {
                condition: Expression::binary(">", Expression::var("target.health"), 0.85.into()).into(),
                then: vec![EffectOperation::TriggerEffect {
                    effect_id: "recur".into(),
                }],
                otherwise: Vec::new(),
            },
        ])
        .with_id("recur");

        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        // 1.0 -> 0.9 -> 0.8, then the condition fails
        assert_eq!(result.damage_dealt, 20.0);
    }

    #[test]
    fn test_emit_event_payload_resolution() {
        let mut arena = arena();
        let effect: EffectExpression = serde_json::from_value(json!({
            "target": {"type": "single"},
            "operations": [{
                "op": "emit_event",
                "eventType": "arcane_burst",
                "payload": {
                    "power": "caster.intelligence",
                    "missing": "caster.nonexistent",
                    "label": "plain text",
                    "scaled": {"op": "*", "left": "caster.intelligence", "right": 2},
                    "broken": {"op": "*", "left": "caster.nonexistent", "right": 2},
                    "weight": 3
                }
            }],
            "timing": {"type": "immediate"}
        }))
        .unwrap();

        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        let event = &result.events[0];
        assert_eq!(event.event_type, "arcane_burst");
        assert_eq!(event.payload["power"], json!(12.0));
        assert_eq!(event.payload["missing"], json!("caster.nonexistent"));
        assert_eq!(event.payload["label"], json!("plain text"));
        assert_eq!(event.payload["scaled"], json!(24.0));
        assert_eq!(event.payload["broken"], serde_json::Value::Null);
        assert_eq!(event.payload["weight"], json!(3));
    }

    #[test]
    fn test_delay_defers_body() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::Delay {
            ticks: 5.into(),
            operations: vec![EffectOperation::damage(50)],
        }]);

        let mut interpreter = EffectInterpreter::default();
        let ctx = ExecutionContext::new(arena.caster, arena.target, 10);
        let result = interpreter.execute(&effect, ctx, &mut arena.world).unwrap();

        assert_eq!(result.damage_dealt, 0.0);
        assert_eq!(result.deferred.len(), 1);
        assert_eq!(result.deferred[0].due_tick, 15);

        let later = interpreter
            .execute_deferred(&result.deferred[0], 15, &mut arena.world)
            .unwrap();
        assert_eq!(later.damage_dealt, 50.0);
        assert_eq!(arena.world.get(arena.target).unwrap().health, Some(0.5));
    }

    #[test]
    fn test_undefined_variable_is_critical() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::damage(Expression::var("caster.nonexistent"))]);
        let err = run(&mut arena, &effect, InterpreterLimits::default()).unwrap_err();
        assert!(matches!(err, InterpreterError::Expression(ExprError::UndefinedVariable(_))));
    }

    #[test]
    fn test_recoverable_error_keeps_partial_effects() {
        let mut arena = arena();
        let effect = single(vec![
            EffectOperation::damage(10),
            EffectOperation::damage(Expression::binary("/", 1.into(), 0.into())),
            EffectOperation::damage(10),
        ]);

        let result = run(&mut arena, &effect, InterpreterLimits::default()).unwrap();
        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(result.damage_dealt, 10.0);
    }

    #[test]
    fn test_no_targets_is_success() {
        let mut world = World::new();
        let caster = world.spawn(Entity::new());
        let effect = EffectExpression::new(TargetSelector::new(TargetKind::Area), Timing::immediate())
            .with_operation(EffectOperation::damage(10));

        let result = EffectInterpreter::default()
            .execute(&effect, ExecutionContext::new(caster, caster, 0), &mut world)
            .unwrap();
        assert!(result.success);
        assert!(result.affected_entities.is_empty());
    }

    #[test]
    fn test_timeout_is_enforced() {
        let mut arena = arena();
        let effect = single(vec![EffectOperation::repeat(900, vec![EffectOperation::heal(0)])]);
        let limits = InterpreterLimits::default().with_timeout(Duration::ZERO);

        let err = run(&mut arena, &effect, limits).unwrap_err();
        assert!(matches!(err, InterpreterError::Timeout { .. }));
    }
}
