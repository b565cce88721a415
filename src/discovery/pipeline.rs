//! The discovery orchestrator.
//!
//! Generate → validate → evaluate → bless → register or preserve. Every
//! candidate the model produces ends up in exactly one place: the spell
//! registry or the artifact store.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::artifacts::{ArtifactStore, RejectedEffectArtifact};
use super::llm::{build_prompt, parse_effect_json, LlmError, LlmProvider, LlmRequest};
use super::spell::{SpellDefinition, SpellRegistry};
use crate::blessing::{BlessingDecision, BlessingService};
use crate::core::{DiscoveryConfig, ForgeConfig};
use crate::evaluation::{EffectEvaluator, EvaluationReport};
use crate::validation::ValidationPipeline;

/// A request to discover a new spell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    /// What the creator wants the spell to do.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paradigm: Option<String>,
    pub creator_id: String,
    pub creator_name: String,
}

impl DiscoveryRequest {
    pub fn new(
        description: impl Into<String>,
        creator_id: impl Into<String>,
        creator_name: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            paradigm: None,
            creator_id: creator_id.into(),
            creator_name: creator_name.into(),
        }
    }

    #[must_use]
    pub fn with_paradigm(mut self, paradigm: impl Into<String>) -> Self {
        self.paradigm = Some(paradigm.into());
        self
    }
}

/// Where a discovery ended up.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryOutcome {
    /// Nothing usable came back from the model. Nothing is preserved.
    GenerationFailed { error: LlmError },
    /// Blessed and registered.
    Registered {
        spell: SpellDefinition,
        decision: BlessingDecision,
        report: EvaluationReport,
    },
    /// Preserved as an artifact. `report` is absent when validation
    /// stopped the candidate before scoring.
    Rejected {
        artifact: RejectedEffectArtifact,
        report: Option<EvaluationReport>,
    },
}

impl DiscoveryOutcome {
    #[must_use]
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }

    #[must_use]
    pub fn spell(&self) -> Option<&SpellDefinition> {
        match self {
            Self::Registered { spell, .. } => Some(spell),
            _ => None,
        }
    }

    #[must_use]
    pub fn artifact(&self) -> Option<&RejectedEffectArtifact> {
        match self {
            Self::Rejected { artifact, .. } => Some(artifact),
            _ => None,
        }
    }
}

impl fmt::Display for DiscoveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenerationFailed { error } => write!(f, "generation failed: {error}"),
            Self::Registered { spell, .. } => write!(f, "registered {}", spell.id),
            Self::Rejected { artifact, .. } => {
                write!(f, "rejected as {} to {}", artifact.category, artifact.realm)
            }
        }
    }
}

/// Runs model output through vetting and files the result.
pub struct EffectDiscovery {
    llm: Arc<dyn LlmProvider>,
    registry: Arc<dyn SpellRegistry>,
    artifacts: Arc<dyn ArtifactStore>,
    validator: ValidationPipeline,
    evaluator: EffectEvaluator,
    blessing: BlessingService,
    config: DiscoveryConfig,
}

impl EffectDiscovery {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        registry: Arc<dyn SpellRegistry>,
        artifacts: Arc<dyn ArtifactStore>,
        config: &ForgeConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            artifacts,
            validator: ValidationPipeline::new(config.limits.clone()),
            evaluator: EffectEvaluator::new(config.thresholds.clone()),
            blessing: BlessingService::new(config.thresholds.clone(), config.discovery.flavor_seed),
            config: config.discovery.clone(),
        }
    }

    /// Replace the blessing service (builder pattern).
    #[must_use]
    pub fn with_blessing(mut self, blessing: BlessingService) -> Self {
        self.blessing = blessing;
        self
    }

    /// Generate a candidate for the request and vet it.
    pub async fn discover(&self, request: &DiscoveryRequest) -> DiscoveryOutcome {
        match self.generate(request).await {
            Ok(raw) => self.vet(raw, request),
            Err(error) => {
                warn!(creator = %request.creator_id, %error, "effect generation failed");
                DiscoveryOutcome::GenerationFailed { error }
            }
        }
    }

    async fn generate(&self, request: &DiscoveryRequest) -> Result<serde_json::Value, LlmError> {
        let llm_request = LlmRequest {
            prompt: build_prompt(&request.description, request.paradigm.as_deref()),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stop_sequences: self.config.stop_sequences.clone(),
        };
        let response = self.llm.generate(llm_request).await?;
        parse_effect_json(&response.text)
    }

    /// Vet an already generated candidate and file it.
    pub fn vet(&self, raw: serde_json::Value, request: &DiscoveryRequest) -> DiscoveryOutcome {
        let paradigm = request.paradigm.as_deref();

        let validation = self.validator.validate(&raw);
        let effect = match (validation.valid, validation.effect.clone()) {
            (true, Some(effect)) => effect,
            _ => {
                let decision = self.blessing.reject_invalid(&validation, paradigm);
                return self.preserve(raw, &decision, request, None);
            }
        };

        let report = self.evaluator.evaluate_value(&raw);
        let decision = self.blessing.bless(&report, paradigm);
        if !decision.blessed {
            return self.preserve(raw, &decision, request, Some(report));
        }

        let spell = SpellDefinition::synthesize(
            effect,
            &request.description,
            paradigm,
            &request.creator_id,
            &request.creator_name,
            &decision,
        );
        self.registry.register(spell.clone());
        info!(
            spell = %spell.id,
            creator = %request.creator_id,
            overall = report.scores.overall,
            "spell registered"
        );

        DiscoveryOutcome::Registered {
            spell,
            decision,
            report,
        }
    }

    fn preserve(
        &self,
        raw: serde_json::Value,
        decision: &BlessingDecision,
        request: &DiscoveryRequest,
        report: Option<EvaluationReport>,
    ) -> DiscoveryOutcome {
        let artifact = self
            .artifacts
            .preserve(raw, decision, &request.creator_id, &request.creator_name);
        info!(
            artifact = %artifact.id,
            creator = %request.creator_id,
            category = %artifact.category,
            realm = %artifact.realm,
            "rejected effect preserved"
        );
        DiscoveryOutcome::Rejected { artifact, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{InMemoryArtifactStore, InMemorySpellRegistry, LlmResponse};
    use serde_json::json;

    struct NoLlm;

    #[async_trait::async_trait]
    impl LlmProvider for NoLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            Err(LlmError::RequestFailed("offline".to_string()))
        }
    }

    fn discovery() -> (EffectDiscovery, Arc<InMemorySpellRegistry>, Arc<InMemoryArtifactStore>) {
        let registry = Arc::new(InMemorySpellRegistry::new());
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let discovery = EffectDiscovery::new(
            Arc::new(NoLlm),
            registry.clone(),
            artifacts.clone(),
            &ForgeConfig::default(),
        );
        (discovery, registry, artifacts)
    }

    fn request() -> DiscoveryRequest {
        DiscoveryRequest::new("a burst of flame", "p1", "Ada").with_paradigm("academic")
    }

    #[test]
    fn test_vet_registers_good_effect() {
        let (discovery, registry, artifacts) = discovery();
        let raw = json!({
            "target": {"type": "area", "radius": 5},
            "operations": [
                {"op": "deal_damage", "amount": 50, "damageType": "fire"},
                {"op": "apply_status", "status": "burning", "duration": 3},
                {"op": "delay", "ticks": 2, "operations": [
                    {"op": "deal_damage", "amount": 20, "damageType": "fire"}
                ]}
            ],
            "timing": {"type": "immediate"}
        });

        let outcome = discovery.vet(raw, &request());
        assert!(outcome.is_registered(), "{outcome}");
        assert_eq!(registry.len(), 1);
        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_vet_preserves_invalid_effect() {
        let (discovery, registry, artifacts) = discovery();
        let raw = json!({"target": {"type": "single"}, "operations": []});

        let outcome = discovery.vet(raw.clone(), &request());
        let artifact = outcome.artifact().unwrap();
        assert_eq!(artifact.effect, raw);
        assert_eq!(artifact.creator_id, "p1");
        assert!(matches!(outcome, DiscoveryOutcome::Rejected { report: None, .. }));
        assert!(registry.is_empty());
        assert_eq!(artifacts.len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_preserves_nothing() {
        let (discovery, registry, artifacts) = discovery();
        let outcome = discovery.discover(&request()).await;
        assert!(matches!(outcome, DiscoveryOutcome::GenerationFailed { .. }));
        assert!(registry.is_empty());
        assert!(artifacts.is_empty());
    }
}
