//! Scoring candidate effects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blessing::{BlessingThresholds, ScoreCategory};
use crate::effects::EffectExpression;
use crate::validation::schema_gaps;

use super::metrics::{self, MetricResult};

pub const SAFETY_WEIGHT: f64 = 0.3;
pub const BALANCE_WEIGHT: f64 = 0.2;
pub const COMPLETENESS_WEIGHT: f64 = 0.3;
pub const CREATIVITY_WEIGHT: f64 = 0.2;

/// Four independent scores plus their weighted sum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub safety: f64,
    pub balance: f64,
    pub completeness: f64,
    pub creativity: f64,
    pub overall: f64,
}

impl EvaluationScores {
    /// Build scores, deriving `overall` from the weights.
    #[must_use]
    pub fn weighted(safety: f64, balance: f64, completeness: f64, creativity: f64) -> Self {
        Self {
            safety,
            balance,
            completeness,
            creativity,
            overall: SAFETY_WEIGHT * safety
                + BALANCE_WEIGHT * balance
                + COMPLETENESS_WEIGHT * completeness
                + CREATIVITY_WEIGHT * creativity,
        }
    }

    /// All zeros.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Safety => self.safety,
            ScoreCategory::Balance => self.balance,
            ScoreCategory::Completeness => self.completeness,
            ScoreCategory::Creativity => self.creativity,
            ScoreCategory::Overall => self.overall,
        }
    }
}

/// Scores plus the reasoning behind them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub scores: EvaluationScores,
    /// Every individual metric met its threshold.
    pub passed: bool,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

/// Pure, deterministic scorer.
#[derive(Clone, Debug, Default)]
pub struct EffectEvaluator {
    thresholds: BlessingThresholds,
}

impl EffectEvaluator {
    /// Create an evaluator that judges `passed` against `thresholds`.
    pub fn new(thresholds: BlessingThresholds) -> Self {
        Self { thresholds }
    }

    /// Score a raw candidate.
    ///
    /// If the candidate cannot be decoded into a typed tree, only
    /// completeness is measured and the other three metrics are zero.
    pub fn evaluate_value(&self, raw: &serde_json::Value) -> EvaluationReport {
        let mut gaps = schema_gaps(raw);
        match EffectExpression::from_value(raw) {
            Ok(effect) => self.score(&effect, gaps),
            Err(err) => {
                if gaps.is_empty() {
                    gaps.push(format!("effect (could not be decoded: {err})"));
                }
                self.short_circuit(gaps)
            }
        }
    }

    /// Score a typed tree.
    pub fn evaluate(&self, effect: &EffectExpression) -> EvaluationReport {
        let gaps = serde_json::to_value(effect)
            .map(|raw| schema_gaps(&raw))
            .unwrap_or_else(|err| vec![format!("effect (could not be encoded: {err})")]);
        self.score(effect, gaps)
    }

    fn score(&self, effect: &EffectExpression, gaps: Vec<String>) -> EvaluationReport {
        let completeness = metrics::completeness(&gaps);
        if completeness.score == 0.0 {
            return self.short_circuit(gaps);
        }
        self.report(
            metrics::safety(effect),
            metrics::balance(effect),
            completeness,
            metrics::creativity(effect),
        )
    }

    fn short_circuit(&self, gaps: Vec<String>) -> EvaluationReport {
        self.report(
            MetricResult::skipped("safety"),
            MetricResult::skipped("balance"),
            metrics::completeness(&gaps),
            MetricResult::skipped("creativity"),
        )
    }

    fn report(
        &self,
        safety: MetricResult,
        balance: MetricResult,
        completeness: MetricResult,
        creativity: MetricResult,
    ) -> EvaluationReport {
        let scores = EvaluationScores::weighted(safety.score, balance.score, completeness.score, creativity.score);

        let failing: Vec<ScoreCategory> = ScoreCategory::METRICS
            .into_iter()
            .filter(|category| !self.thresholds.meets(&scores, *category))
            .collect();
        let passed = failing.is_empty();

        let reasons = [safety, balance, completeness, creativity]
            .into_iter()
            .flat_map(|metric| metric.findings)
            .collect();
        let recommendations = failing.into_iter().map(recommendation).map(String::from).collect();

        debug!(
            safety = scores.safety,
            balance = scores.balance,
            completeness = scores.completeness,
            creativity = scores.creativity,
            overall = scores.overall,
            passed,
            "effect evaluated"
        );

        EvaluationReport {
            scores,
            passed,
            reasons,
            recommendations,
        }
    }
}

fn recommendation(category: ScoreCategory) -> &'static str {
    match category {
        ScoreCategory::Safety => "Keep damage and healing at or below 10,000, spawns at or below 50 and chains at or below 5",
        ScoreCategory::Balance => "Keep damage between 5 and 5,000, use at most 10 operations and radii of at most 50",
        ScoreCategory::Completeness => "Provide target.type, timing.type and a non-empty list of recognized operations",
        ScoreCategory::Creativity => "Combine operation kinds, add conditions or composition, or use spread targeting and non-immediate timing",
        ScoreCategory::Overall => "Raise the weaker scores",
    }
}
