//! Staged validation of candidate effects.
//!
//! Stages run in order and stop at the first one that reports issues:
//!
//! 1. **Schema**: raw completeness gaps, then decoding into a typed tree
//! 2. **Security**: every string in the raw tree against the denylist,
//!    identifier fields against the identifier grammar and vocabularies
//! 3. **DryRun**: execute against a snapshot of a sandbox world, following
//!    deferred bodies; any critical interpreter error fails. The operation
//!    limit and timeout cover the whole dry run, deferred bodies included.
//!
//! Validation never returns `Err`. Every outcome is a [`ValidationResult`]
//! so the discovery pipeline can route failures into artifacts.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{Entity, EntityId, InterpreterLimits, World};
use crate::effects::{
    vocab, DeferredQueue, EffectExpression, EffectInterpreter, EffectOperation, ExecutionContext,
    InterpreterError,
};
use crate::security::{self, SecurityViolation};

use super::schema_gaps;

/// Which stage rejected a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    Schema,
    Security,
    DryRun,
}

impl std::fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Schema => "schema",
            Self::Security => "security",
            Self::DryRun => "dry_run",
        };
        f.write_str(name)
    }
}

/// One problem found in a candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub stage: ValidationStage,
    /// Path of the offending field, or `effect` for whole-tree problems.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(stage: ValidationStage, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of validating one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// The failing stage, if any.
    pub stage: Option<ValidationStage>,
    pub issues: Vec<ValidationIssue>,
    /// The decoded tree, when decoding got that far.
    pub effect: Option<EffectExpression>,
}

impl ValidationResult {
    fn passed(effect: EffectExpression) -> Self {
        Self {
            valid: true,
            stage: None,
            issues: Vec::new(),
            effect: Some(effect),
        }
    }

    fn failed(stage: ValidationStage, issues: Vec<ValidationIssue>, effect: Option<EffectExpression>) -> Self {
        Self {
            valid: false,
            stage: Some(stage),
            issues,
            effect,
        }
    }

    /// All issues joined into one line.
    #[must_use]
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs schema, security and dry-run checks.
#[derive(Clone, Debug)]
pub struct ValidationPipeline {
    limits: InterpreterLimits,
    sandbox: World,
    caster: EntityId,
    target: EntityId,
}

impl ValidationPipeline {
    /// Create a pipeline whose dry runs use `limits`.
    pub fn new(limits: InterpreterLimits) -> Self {
        let (sandbox, caster, target) = sandbox();
        Self {
            limits,
            sandbox,
            caster,
            target,
        }
    }

    /// Validate a raw JSON candidate.
    pub fn validate(&self, raw: &serde_json::Value) -> ValidationResult {
        let result = self.run_stages(raw);
        match result.stage {
            Some(stage) => warn!(
                %stage,
                issues = result.issues.len(),
                summary = %result.summary(),
                "effect failed validation"
            ),
            None => debug!("effect passed validation"),
        }
        result
    }

    /// Validate an already-typed effect.
    pub fn validate_effect(&self, effect: &EffectExpression) -> ValidationResult {
        match serde_json::to_value(effect) {
            Ok(raw) => self.validate(&raw),
            Err(err) => ValidationResult::failed(
                ValidationStage::Schema,
                vec![ValidationIssue::new(ValidationStage::Schema, "effect", err.to_string())],
                Some(effect.clone()),
            ),
        }
    }

    fn run_stages(&self, raw: &serde_json::Value) -> ValidationResult {
        let gaps = schema_gaps(raw);
        if !gaps.is_empty() {
            let issues = gaps
                .into_iter()
                .map(|gap| ValidationIssue::new(ValidationStage::Schema, gap, "missing or invalid"))
                .collect();
            return ValidationResult::failed(ValidationStage::Schema, issues, None);
        }

        let effect = match EffectExpression::from_value(raw) {
            Ok(effect) => effect,
            Err(err) => {
                let issue = ValidationIssue::new(ValidationStage::Schema, "effect", err.to_string());
                return ValidationResult::failed(ValidationStage::Schema, vec![issue], None);
            }
        };

        let mut issues = Vec::new();
        scan_strings(raw, "effect", &mut issues);
        check_identifiers(&effect, &mut issues);
        if !issues.is_empty() {
            return ValidationResult::failed(ValidationStage::Security, issues, Some(effect));
        }

        if let Err(issue) = self.dry_run(&effect) {
            return ValidationResult::failed(ValidationStage::DryRun, vec![issue], Some(effect));
        }

        ValidationResult::passed(effect)
    }

    fn dry_run(&self, effect: &EffectExpression) -> Result<(), ValidationIssue> {
        let mut world = self.sandbox.snapshot();
        let mut interpreter = EffectInterpreter::new(self.limits.clone());
        let failed = |err: InterpreterError| ValidationIssue::new(ValidationStage::DryRun, "effect", err.to_string());

        let started = Instant::now();
        let result = interpreter
            .execute(effect, ExecutionContext::new(self.caster, self.target, 0), &mut world)
            .map_err(failed)?;
        let mut operations = result.operations_executed;

        let mut queue = DeferredQueue::new();
        queue.schedule_all(result.deferred);
        while let Some(tick) = queue.next_due() {
            world.set_tick(tick);
            for deferred in queue.drain_due(tick) {
                let later = interpreter
                    .execute_deferred(&deferred, tick, &mut world)
                    .map_err(failed)?;
                operations = operations.saturating_add(later.operations_executed);
                self.check_budget(operations, started).map_err(failed)?;
                queue.schedule_all(later.deferred);
            }
        }
        Ok(())
    }

    /// Deferred bodies run with fresh counters, so the dry run keeps its
    /// own running totals against the same limits.
    fn check_budget(&self, operations: u32, started: Instant) -> Result<(), InterpreterError> {
        if operations > self.limits.max_operations {
            return Err(InterpreterError::OperationLimit {
                limit: self.limits.max_operations,
            });
        }
        if let Some(limit) = self.limits.timeout() {
            let elapsed = started.elapsed();
            if elapsed > limit {
                return Err(InterpreterError::Timeout {
                    elapsed_ms: elapsed.as_millis() as u64,
                    limit_ms: limit.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new(InterpreterLimits::default())
    }
}

/// A small world with a caster, a target and bystanders, every entity
/// carrying every known stat.
fn sandbox() -> (World, EntityId, EntityId) {
    let mut world = World::new();
    let caster = world.spawn(sandbox_entity(0.0, 0.0).with_faction("caster"));
    let target = world.spawn(sandbox_entity(3.0, 0.0).with_faction("hostile"));
    for offset in 1..=3 {
        world.spawn(sandbox_entity(-f64::from(offset), 2.0).with_faction("hostile"));
    }
    (world, caster, target)
}

fn sandbox_entity(x: f64, y: f64) -> Entity {
    vocab::ALLOWED_STATS
        .iter()
        .fold(Entity::new().at(x, y).with_health(1.0), |entity, stat| {
            entity.with_stat(*stat, 10.0)
        })
        .with_archetype("spirit")
}

/// Denylist every string value and key in the raw tree.
fn scan_strings(value: &serde_json::Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    match value {
        serde_json::Value::String(text) => push_violation(security::check_text(path, text), issues),
        serde_json::Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                scan_strings(item, &format!("{path}[{index}]"), issues);
            }
        }
        serde_json::Value::Object(fields) => {
            for (key, item) in fields {
                let child = format!("{path}.{key}");
                push_violation(security::check_text(&child, key), issues);
                scan_strings(item, &child, issues);
            }
        }
        _ => {}
    }
}

fn check_identifiers(effect: &EffectExpression, issues: &mut Vec<ValidationIssue>) {
    for operation in effect.walk_operations() {
        let (field, value, allowed): (&str, &str, Option<&[&str]>) = match operation {
            EffectOperation::ModifyStat { stat, .. } | EffectOperation::SetStat { stat, .. } => {
                ("stat", stat.as_str(), Some(vocab::ALLOWED_STATS))
            }
            EffectOperation::ApplyStatus { status, .. } | EffectOperation::RemoveStatus { status } => {
                ("status", status.as_str(), Some(vocab::ALLOWED_STATUSES))
            }
            EffectOperation::SpawnEntity { entity_type, .. } => {
                ("entityType", entity_type.as_str(), Some(vocab::ALLOWED_ARCHETYPES))
            }
            EffectOperation::TransformEntity { to } => ("to", to.as_str(), Some(vocab::ALLOWED_ARCHETYPES)),
            EffectOperation::TransformMaterial { material } => {
                ("material", material.as_str(), Some(vocab::ALLOWED_MATERIALS))
            }
            EffectOperation::SpawnItem { item_type, .. } => ("itemType", item_type.as_str(), None),
            EffectOperation::EmitEvent { event_type, .. } => ("eventType", event_type.as_str(), None),
            _ => continue,
        };

        let path = format!("{}.{field}", operation.name());
        if let Err(violation) = security::check_identifier(&path, value) {
            push_violation(Err(violation), issues);
        } else if allowed.is_some_and(|names| !names.contains(&value)) {
            issues.push(ValidationIssue::new(
                ValidationStage::Security,
                path,
                format!("{value:?} is not a recognized {field}"),
            ));
        }
    }
}

fn push_violation(check: Result<(), SecurityViolation>, issues: &mut Vec<ValidationIssue>) {
    if let Err(violation) = check {
        issues.push(ValidationIssue::new(
            ValidationStage::Security,
            violation.field().to_string(),
            violation.to_string(),
        ));
    }
}
