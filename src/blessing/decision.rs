//! The approve/reject decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationScores;

use super::{BlessingThresholds, ScoreCategory};

/// Overall score above which an approval is exceptional.
pub const EXCEPTIONAL_OVERALL: f64 = 0.9;

/// Outcome of comparing scores to thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Blessed { exceptional: bool },
    /// `category` is the first shortfall in check order.
    Rejected { category: ScoreCategory },
}

impl Verdict {
    #[must_use]
    pub fn is_blessed(self) -> bool {
        matches!(self, Self::Blessed { .. })
    }
}

/// Pure threshold comparison. No randomness, no clock.
///
/// ```
/// use effect_forge::blessing::{decide, BlessingThresholds, ScoreCategory, Verdict};
/// use effect_forge::evaluation::EvaluationScores;
///
/// let scores = EvaluationScores::weighted(1.0, 0.6, 1.0, 1.0);
/// assert_eq!(
///     decide(&scores, &BlessingThresholds::default()),
///     Verdict::Rejected { category: ScoreCategory::Balance }
/// );
/// ```
#[must_use]
pub fn decide(scores: &EvaluationScores, thresholds: &BlessingThresholds) -> Verdict {
    match thresholds.first_failure(scores) {
        Some(category) => Verdict::Rejected { category },
        None => Verdict::Blessed {
            exceptional: scores.overall > EXCEPTIONAL_OVERALL,
        },
    }
}

/// A reviewed decision with its theming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlessingDecision {
    pub blessed: bool,
    pub reason: String,
    pub deity: String,
    pub scores: EvaluationScores,
    /// First failing category, for rejections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_category: Option<ScoreCategory>,
    pub timestamp: DateTime<Utc>,
}
