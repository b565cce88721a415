//! The four quality metrics.
//!
//! Each metric is a pure function of a tree's static structure and
//! returns a score in `[0, 1]` plus human-readable findings. Amounts,
//! counts and radii are checked across every nested operation body.

use crate::effects::{EffectExpression, EffectOperation, TargetSelector, TimingKind};
use crate::expr::Expression;

use super::numeric::conservative_value;

/// Largest damage or healing amount considered safe.
pub const MAX_SAFE_AMOUNT: f64 = 10_000.0;
/// Largest spawn count considered safe.
pub const MAX_SAFE_SPAWNS: f64 = 50.0;
/// Largest number of `chain_effect` operations considered safe.
pub const MAX_SAFE_CHAINS: usize = 5;

/// Damage range considered balanced.
pub const BALANCED_DAMAGE: (f64, f64) = (5.0, 5_000.0);
/// Operation count above which an effect is considered bloated.
pub const MAX_BALANCED_OPERATIONS: usize = 10;
/// Radius above which spread targeting is considered oversized.
pub const MAX_BALANCED_RADIUS: f64 = 50.0;

const SAFETY_PENALTY: f64 = 0.25;
const BALANCE_PENALTY: f64 = 0.15;
const COMPLETENESS_PENALTY: f64 = 0.2;
const CREATIVITY_POINTS: u32 = 5;

/// Score and findings for one metric.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricResult {
    pub score: f64,
    pub findings: Vec<String>,
}

impl MetricResult {
    fn penalized(findings: Vec<String>, penalty: f64) -> Self {
        Self {
            score: (1.0 - penalty * findings.len() as f64).max(0.0),
            findings,
        }
    }

    /// A zero score for trees too malformed to inspect.
    pub fn skipped(metric: &str) -> Self {
        Self {
            score: 0.0,
            findings: vec![format!("{metric} not evaluated: effect is incomplete")],
        }
    }
}

/// Hard-limit violations: oversized amounts and spawns, non-finite
/// values, excessive chaining.
pub fn safety(effect: &EffectExpression) -> MetricResult {
    let mut violations = Vec::new();
    let mut chains = 0;

    for operation in effect.walk_operations() {
        match operation {
            EffectOperation::DealDamage { amount, .. } => check_amount("Damage", amount, &mut violations),
            EffectOperation::Heal { amount } => check_amount("Healing", amount, &mut violations),
            EffectOperation::SpawnEntity { count, .. } | EffectOperation::SpawnItem { count, .. } => {
                let count = count.as_ref().map_or(1.0, conservative_value);
                if !count.is_finite() {
                    violations.push(format!("Spawn count {count} is not finite"));
                } else if count > MAX_SAFE_SPAWNS {
                    violations.push(format!("Spawn count {count} exceeds max 50"));
                }
            }
            EffectOperation::ChainEffect { .. } => chains += 1,
            _ => {}
        }
    }

    if chains > MAX_SAFE_CHAINS {
        violations.push(format!("Chain depth {chains} exceeds max 5"));
    }

    MetricResult::penalized(violations, SAFETY_PENALTY)
}

fn check_amount(label: &str, amount: &Expression, violations: &mut Vec<String>) {
    let value = conservative_value(amount);
    if !value.is_finite() {
        violations.push(format!("{label} {value} is not finite"));
    } else if value.abs() > MAX_SAFE_AMOUNT {
        violations.push(format!("{label} {value} exceeds max 10,000 in magnitude"));
    }
}

/// Soft design concerns: bloat, damage outside the sensible band,
/// oversized areas.
pub fn balance(effect: &EffectExpression) -> MetricResult {
    let mut issues = Vec::new();
    let operations = effect.walk_operations();

    if operations.len() > MAX_BALANCED_OPERATIONS {
        issues.push(format!(
            "Too many operations ({} > {MAX_BALANCED_OPERATIONS})",
            operations.len()
        ));
    }

    let (low, high) = BALANCED_DAMAGE;
    for operation in &operations {
        match operation {
            EffectOperation::DealDamage { amount, .. } => {
                let damage = conservative_value(amount);
                if damage > high {
                    issues.push(format!("Very high damage ({damage})"));
                } else if damage < low {
                    issues.push(format!("Very low damage ({damage})"));
                }
            }
            EffectOperation::ChainEffect { new_target, .. } => check_radius(new_target, &mut issues),
            _ => {}
        }
    }
    check_radius(&effect.target, &mut issues);

    MetricResult::penalized(issues, BALANCE_PENALTY)
}

fn check_radius(selector: &TargetSelector, issues: &mut Vec<String>) {
    if let Some(radius) = selector.radius.filter(|_| selector.is_spread()) {
        if radius > MAX_BALANCED_RADIUS {
            issues.push(format!("Very large target radius ({radius})"));
        }
    }
}

/// Score structural gaps, as produced by
/// [`schema_gaps`](crate::validation::schema_gaps).
pub fn completeness(gaps: &[String]) -> MetricResult {
    MetricResult::penalized(
        gaps.iter().map(|gap| format!("Missing or invalid: {gap}")).collect(),
        COMPLETENESS_PENALTY,
    )
}

/// One point each for variety, preconditions, composition, non-immediate
/// timing and spread targeting.
pub fn creativity(effect: &EffectExpression) -> MetricResult {
    let operations = effect.walk_operations();
    let mut kinds: Vec<&str> = operations.iter().map(|op| op.name()).collect();
    kinds.sort_unstable();
    kinds.dedup();

    let awarded = [
        kinds.len() >= 2,
        !effect.conditions.is_empty(),
        operations.iter().any(|op| op.is_advanced()),
        matches!(effect.timing.kind, TimingKind::Delayed | TimingKind::Periodic),
        effect.target.is_spread(),
    ];
    let points = awarded.iter().filter(|hit| **hit).count() as u32;

    MetricResult {
        score: f64::from(points) / f64::from(CREATIVITY_POINTS),
        findings: vec![format!("Creativity score: {points}/{CREATIVITY_POINTS}")],
    }
}
