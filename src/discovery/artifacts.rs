//! Rejected effect artifacts.
//!
//! A rejected candidate is never dropped. It is banished to a realm named
//! after why it failed, with a danger level and a list of what it would
//! take to recover it. Everything here is a pure function of the decision,
//! so the same rejection always lands in the same place.
//!
//! ## Categories
//!
//! | Failed score | Category | Realm |
//! |---|---|---|
//! | safety | `forbidden` | The Sealed Vault |
//! | balance | `unstable` | The Shifting Wastes |
//! | completeness | `incomplete` | The Unfinished Library |
//! | creativity | `mundane` | The Grey Archive |
//! | overall | `lesser` | The Hall of Near Misses |

use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blessing::{BlessingDecision, BlessingThresholds, ScoreCategory};
use crate::evaluation::EvaluationScores;

/// Why an artifact was banished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    Forbidden,
    Unstable,
    Incomplete,
    Mundane,
    Lesser,
}

impl RejectionCategory {
    /// Category for a failed score.
    #[must_use]
    pub fn from_score(category: ScoreCategory) -> Self {
        match category {
            ScoreCategory::Safety => Self::Forbidden,
            ScoreCategory::Balance => Self::Unstable,
            ScoreCategory::Completeness => Self::Incomplete,
            ScoreCategory::Creativity => Self::Mundane,
            ScoreCategory::Overall => Self::Lesser,
        }
    }

    /// Category for a rejection.
    ///
    /// Uses the decision's recorded failure, falling back to the first
    /// default threshold the scores miss.
    #[must_use]
    pub fn for_decision(decision: &BlessingDecision) -> Self {
        decision
            .failed_category
            .or_else(|| BlessingThresholds::default().first_failure(&decision.scores))
            .map_or(Self::Lesser, Self::from_score)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::Unstable => "unstable",
            Self::Incomplete => "incomplete",
            Self::Mundane => "mundane",
            Self::Lesser => "lesser",
        }
    }

    #[must_use]
    pub fn realm(self) -> &'static str {
        match self {
            Self::Forbidden => "The Sealed Vault",
            Self::Unstable => "The Shifting Wastes",
            Self::Incomplete => "The Unfinished Library",
            Self::Mundane => "The Grey Archive",
            Self::Lesser => "The Hall of Near Misses",
        }
    }

    /// What a creator must do to bring an artifact of this kind back.
    #[must_use]
    pub fn recovery_requirements(self) -> &'static [&'static str] {
        match self {
            Self::Forbidden => &[
                "Remove every operation that exceeds safe limits",
                "Pass a full security review",
                "Obtain a sponsoring deity's dispensation",
            ],
            Self::Unstable => &[
                "Bring damage into a balanced range",
                "Reduce the operation count",
                "Narrow the area of effect",
            ],
            Self::Incomplete => &["Supply the missing target, operations or timing"],
            Self::Mundane => &[
                "Add a novel mechanic",
                "Combine more than one kind of operation",
            ],
            Self::Lesser => &["Improve the effect until its overall score qualifies"],
        }
    }
}

impl fmt::Display for RejectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Danger level from 1 (harmless) to 10 (catastrophic), driven by safety.
#[must_use]
pub fn danger_level(scores: &EvaluationScores) -> u8 {
    let safety = if scores.safety.is_finite() {
        scores.safety.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (1.0 + ((1.0 - safety) * 9.0).round()) as u8
}

/// Permanent record of a rejected effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEffectArtifact {
    pub id: Uuid,
    /// The candidate exactly as it was generated.
    pub effect: serde_json::Value,
    pub reason: String,
    pub category: RejectionCategory,
    pub realm: String,
    pub danger_level: u8,
    pub recovery_requirements: Vec<String>,
    pub creator_id: String,
    pub creator_name: String,
    pub deity: String,
    pub scores: EvaluationScores,
    pub rejected_at: DateTime<Utc>,
}

impl RejectedEffectArtifact {
    pub fn new(
        effect: serde_json::Value,
        decision: &BlessingDecision,
        creator_id: impl Into<String>,
        creator_name: impl Into<String>,
    ) -> Self {
        let category = RejectionCategory::for_decision(decision);
        Self {
            id: Uuid::new_v4(),
            effect,
            reason: decision.reason.clone(),
            category,
            realm: category.realm().to_string(),
            danger_level: danger_level(&decision.scores),
            recovery_requirements: category
                .recovery_requirements()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            creator_id: creator_id.into(),
            creator_name: creator_name.into(),
            deity: decision.deity.clone(),
            scores: decision.scores,
            rejected_at: decision.timestamp,
        }
    }
}

/// Where rejected effects are kept.
pub trait ArtifactStore: Send + Sync {
    /// Record a rejection and return the stored artifact.
    fn preserve(
        &self,
        effect: serde_json::Value,
        decision: &BlessingDecision,
        creator_id: &str,
        creator_name: &str,
    ) -> RejectedEffectArtifact;

    fn get(&self, id: Uuid) -> Option<RejectedEffectArtifact>;

    fn by_creator(&self, creator_id: &str) -> Vec<RejectedEffectArtifact>;

    fn by_realm(&self, realm: &str) -> Vec<RejectedEffectArtifact>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Store backed by an in-process list, in preservation order.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<Vec<RejectedEffectArtifact>>,
}

impl InMemoryArtifactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, keep: impl Fn(&RejectedEffectArtifact) -> bool) -> Vec<RejectedEffectArtifact> {
        self.artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| keep(*a))
            .cloned()
            .collect()
    }

    /// Export every artifact as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let artifacts = self.artifacts.read().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_string(&*artifacts)
    }

    /// Rebuild a store from [`InMemoryArtifactStore::to_json`] output.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let artifacts: Vec<RejectedEffectArtifact> = serde_json::from_str(json)?;
        Ok(Self {
            artifacts: RwLock::new(artifacts),
        })
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn preserve(
        &self,
        effect: serde_json::Value,
        decision: &BlessingDecision,
        creator_id: &str,
        creator_name: &str,
    ) -> RejectedEffectArtifact {
        let artifact = RejectedEffectArtifact::new(effect, decision, creator_id, creator_name);
        self.artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.clone());
        artifact
    }

    fn get(&self, id: Uuid) -> Option<RejectedEffectArtifact> {
        self.filtered(|a| a.id == id).into_iter().next()
    }

    fn by_creator(&self, creator_id: &str) -> Vec<RejectedEffectArtifact> {
        self.filtered(|a| a.creator_id == creator_id)
    }

    fn by_realm(&self, realm: &str) -> Vec<RejectedEffectArtifact> {
        self.filtered(|a| a.realm == realm)
    }

    fn len(&self) -> usize {
        self.artifacts.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejection(scores: EvaluationScores, failed: Option<ScoreCategory>) -> BlessingDecision {
        BlessingDecision {
            blessed: false,
            reason: "The Arbiter of Spells frowns".to_string(),
            deity: "The Arbiter of Spells".to_string(),
            scores,
            failed_category: failed,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(RejectionCategory::from_score(ScoreCategory::Safety), RejectionCategory::Forbidden);
        assert_eq!(RejectionCategory::from_score(ScoreCategory::Balance), RejectionCategory::Unstable);
        assert_eq!(
            RejectionCategory::from_score(ScoreCategory::Completeness),
            RejectionCategory::Incomplete
        );
        assert_eq!(RejectionCategory::from_score(ScoreCategory::Creativity), RejectionCategory::Mundane);
        assert_eq!(RejectionCategory::from_score(ScoreCategory::Overall), RejectionCategory::Lesser);
    }

    #[test]
    fn test_category_falls_back_to_scores() {
        let decision = rejection(EvaluationScores::weighted(1.0, 0.2, 1.0, 1.0), None);
        assert_eq!(RejectionCategory::for_decision(&decision), RejectionCategory::Unstable);
    }

    #[test]
    fn test_danger_level_bounds() {
        assert_eq!(danger_level(&EvaluationScores::zero()), 10);
        assert_eq!(danger_level(&EvaluationScores::weighted(1.0, 0.0, 0.0, 0.0)), 1);
        assert_eq!(danger_level(&EvaluationScores::weighted(0.5, 0.0, 0.0, 0.0)), 6);
    }

    #[test]
    fn test_zero_score_artifact_is_forbidden() {
        let decision = rejection(EvaluationScores::zero(), Some(ScoreCategory::Safety));
        let artifact = RejectedEffectArtifact::new(json!({"bad": true}), &decision, "p1", "Ada");
        assert_eq!(artifact.category, RejectionCategory::Forbidden);
        assert_eq!(artifact.realm, "The Sealed Vault");
        assert_eq!(artifact.danger_level, 10);
        assert_eq!(artifact.recovery_requirements.len(), 3);
    }

    #[test]
    fn test_store_queries() {
        let store = InMemoryArtifactStore::new();
        let unsafe_decision = rejection(EvaluationScores::zero(), Some(ScoreCategory::Safety));
        let dull = rejection(
            EvaluationScores::weighted(1.0, 1.0, 1.0, 0.2),
            Some(ScoreCategory::Creativity),
        );

        let a = store.preserve(json!({"n": 1}), &unsafe_decision, "p1", "Ada");
        store.preserve(json!({"n": 2}), &dull, "p2", "Grace");
        store.preserve(json!({"n": 3}), &dull, "p1", "Ada");

        assert_eq!(store.len(), 3);
        assert_eq!(store.by_creator("p1").len(), 2);
        assert_eq!(store.by_realm("The Grey Archive").len(), 2);
        assert_eq!(store.by_realm("The Sealed Vault").len(), 1);
        assert_eq!(store.get(a.id), Some(a));
    }

    #[test]
    fn test_store_json_round_trip() {
        let store = InMemoryArtifactStore::new();
        let decision = rejection(EvaluationScores::zero(), Some(ScoreCategory::Safety));
        store.preserve(json!({"target": {"type": "area"}}), &decision, "p1", "Ada");

        let json = store.to_json().unwrap();
        let restored = InMemoryArtifactStore::from_json(&json).unwrap();
        assert_eq!(restored.by_creator("p1"), store.by_creator("p1"));
    }
}
