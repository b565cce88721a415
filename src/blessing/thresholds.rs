//! Minimum scores for approval.

use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationScores;

/// Per-category minimums. A score equal to its threshold passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlessingThresholds {
    pub safety: f64,
    pub balance: f64,
    pub completeness: f64,
    pub creativity: f64,
    pub overall: f64,
}

impl Default for BlessingThresholds {
    fn default() -> Self {
        Self {
            safety: 1.0,
            balance: 0.7,
            completeness: 1.0,
            creativity: 0.4,
            overall: 0.6,
        }
    }
}

/// Scored categories, in the order they are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Safety,
    Balance,
    Completeness,
    Creativity,
    Overall,
}

impl ScoreCategory {
    /// Check order for blessing decisions.
    pub const ALL: [ScoreCategory; 5] = [
        Self::Safety,
        Self::Balance,
        Self::Completeness,
        Self::Creativity,
        Self::Overall,
    ];

    /// The four independent metrics, without the weighted overall.
    pub const METRICS: [ScoreCategory; 4] = [Self::Safety, Self::Balance, Self::Completeness, Self::Creativity];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::Balance => "balance",
            Self::Completeness => "completeness",
            Self::Creativity => "creativity",
            Self::Overall => "overall",
        }
    }
}

impl std::fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl BlessingThresholds {
    pub fn with_safety(mut self, min: f64) -> Self {
        self.safety = min;
        self
    }

    pub fn with_balance(mut self, min: f64) -> Self {
        self.balance = min;
        self
    }

    pub fn with_completeness(mut self, min: f64) -> Self {
        self.completeness = min;
        self
    }

    pub fn with_creativity(mut self, min: f64) -> Self {
        self.creativity = min;
        self
    }

    pub fn with_overall(mut self, min: f64) -> Self {
        self.overall = min;
        self
    }

    /// Threshold for one category.
    #[must_use]
    pub fn minimum(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Safety => self.safety,
            ScoreCategory::Balance => self.balance,
            ScoreCategory::Completeness => self.completeness,
            ScoreCategory::Creativity => self.creativity,
            ScoreCategory::Overall => self.overall,
        }
    }

    /// Whether `scores` meets the threshold for `category`.
    #[must_use]
    pub fn meets(&self, scores: &EvaluationScores, category: ScoreCategory) -> bool {
        scores.get(category) >= self.minimum(category)
    }

    /// First category in check order that falls short.
    #[must_use]
    pub fn first_failure(&self, scores: &EvaluationScores) -> Option<ScoreCategory> {
        ScoreCategory::ALL
            .into_iter()
            .find(|category| !self.meets(scores, *category))
    }
}
