//! Blessing service: decision plus theming.

use chrono::Utc;
use tracing::{info, warn};

use crate::evaluation::{EvaluationReport, EvaluationScores};
use crate::validation::ValidationResult;

use super::phrases::{self, deity_for, render};
use super::{decide, BlessingDecision, BlessingThresholds, FirstPhrase, PhrasePicker, SeededPicker, Verdict};

/// Reviews evaluation reports and produces themed decisions.
pub struct BlessingService {
    thresholds: BlessingThresholds,
    picker: Box<dyn PhrasePicker>,
}

impl BlessingService {
    /// Create a service with seeded flavor text.
    pub fn new(thresholds: BlessingThresholds, flavor_seed: u64) -> Self {
        Self::with_picker(thresholds, Box::new(SeededPicker::new(flavor_seed)))
    }

    /// Create a service with a custom phrase picker.
    pub fn with_picker(thresholds: BlessingThresholds, picker: Box<dyn PhrasePicker>) -> Self {
        Self { thresholds, picker }
    }

    #[must_use]
    pub fn thresholds(&self) -> &BlessingThresholds {
        &self.thresholds
    }

    /// Judge a report. `paradigm` selects the reviewing deity.
    pub fn bless(&self, report: &EvaluationReport, paradigm: Option<&str>) -> BlessingDecision {
        let deity = deity_for(paradigm);
        let scores = report.scores;

        match decide(&scores, &self.thresholds) {
            Verdict::Blessed { exceptional } => {
                let pool = if exceptional { phrases::EXCEPTIONAL } else { phrases::APPROVAL };
                info!(deity, overall = scores.overall, exceptional, "effect blessed");
                BlessingDecision {
                    blessed: true,
                    reason: render(self.picker.pick(pool), deity),
                    deity: deity.to_string(),
                    scores,
                    failed_category: None,
                    timestamp: Utc::now(),
                }
            }
            Verdict::Rejected { category } => {
                let phrase = render(self.picker.pick(phrases::rejection(category)), deity);
                let reason = format!(
                    "{phrase} ({category} {:.2} < {:.2})",
                    scores.get(category),
                    self.thresholds.minimum(category)
                );
                warn!(deity, %category, overall = scores.overall, "effect rejected");
                BlessingDecision {
                    blessed: false,
                    reason,
                    deity: deity.to_string(),
                    scores,
                    failed_category: Some(category),
                    timestamp: Utc::now(),
                }
            }
        }
    }

    /// A zero-score rejection for a candidate that never reached scoring.
    pub fn reject_invalid(&self, validation: &ValidationResult, paradigm: Option<&str>) -> BlessingDecision {
        let deity = deity_for(paradigm);
        let scores = EvaluationScores::zero();
        let stage = validation
            .stage
            .map_or_else(|| "validation".to_string(), |stage| stage.to_string());
        let reason = format!(
            "{} ({stage}: {})",
            render(self.picker.pick(phrases::INVALID), deity),
            validation.summary()
        );
        warn!(deity, %stage, "invalid effect rejected");

        BlessingDecision {
            blessed: false,
            reason,
            deity: deity.to_string(),
            failed_category: self.thresholds.first_failure(&scores),
            scores,
            timestamp: Utc::now(),
        }
    }
}

impl Default for BlessingService {
    /// Default thresholds and deterministic first-phrase flavor.
    fn default() -> Self {
        Self::with_picker(BlessingThresholds::default(), Box::new(FirstPhrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blessing::ScoreCategory;

    fn report(scores: EvaluationScores) -> EvaluationReport {
        EvaluationReport {
            scores,
            passed: true,
            reasons: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn test_bless_approves() {
        let service = BlessingService::default();
        let decision = service.bless(&report(EvaluationScores::weighted(1.0, 0.8, 1.0, 0.6)), Some("divine"));

        assert!(decision.blessed);
        assert_eq!(decision.deity, "The Radiant Pantheon");
        assert_eq!(
            decision.reason,
            "The Radiant Pantheon finds the weave sound and grants it passage into the world."
        );
        assert!(decision.failed_category.is_none());
    }

    #[test]
    fn test_bless_rejects_with_category() {
        let service = BlessingService::default();
        let decision = service.bless(&report(EvaluationScores::weighted(1.0, 1.0, 1.0, 0.2)), None);

        assert!(!decision.blessed);
        assert_eq!(decision.deity, "The Arbiter of Spells");
        assert_eq!(decision.failed_category, Some(ScoreCategory::Creativity));
        assert!(decision.reason.contains("creativity 0.20 < 0.40"));
    }

    #[test]
    fn test_decision_ignores_flavor_seed() {
        let scores = EvaluationScores::weighted(1.0, 0.65, 1.0, 1.0);
        for seed in 0..20 {
            let service = BlessingService::new(BlessingThresholds::default(), seed);
            assert!(!service.bless(&report(scores), Some("pact")).blessed);
        }
    }
}
