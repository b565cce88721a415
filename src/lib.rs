//! # effect-forge
//!
//! A bounded interpreter and vetting pipeline for declarative magic effect
//! programs.
//!
//! ## Design Principles
//!
//! 1. **Bounded Execution**: Every run is capped on depth, operation count,
//!    entities touched, damage, spawns and chain fan-out. Critical limit
//!    breaches abort the run; everything else degrades gracefully.
//!
//! 2. **Nothing Is Discarded**: A generated candidate always ends up as a
//!    registered spell or a catalogued rejection artifact.
//!
//! 3. **Structured Outcomes**: Validation and evaluation return reports,
//!    never errors, so the orchestrator can route every result.
//!
//! ## Architecture
//!
//! - **Persistent World**: Dry runs execute against an O(1) `im` snapshot
//!   of a sandbox world.
//!
//! - **Safe Expressions**: Amounts and conditions are a small pure
//!   expression language with its own depth and operation bounds.
//!
//! - **Async Only at the Edge**: The language model call is the single
//!   suspension point. Every other stage is synchronous.
//!
//! ## Modules
//!
//! - `core`: Entity ids, world store, RNG, configuration
//! - `expr`: Safe expression language and evaluator
//! - `security`: Injection denylist and identifier checks
//! - `effects`: Effect trees, targeting and the bounded interpreter
//! - `validation`: Schema, security and dry-run validation
//! - `evaluation`: Safety, balance, completeness and creativity scoring
//! - `blessing`: Approve/reject decisions with deity flavor
//! - `discovery`: LLM generation through to registration or preservation

pub mod core;
pub mod expr;
pub mod security;
pub mod effects;
pub mod validation;
pub mod evaluation;
pub mod blessing;
pub mod discovery;

// Re-export commonly used types
pub use crate::core::{
    EntityId, Entity, Position, World,
    FlavorRng,
    ForgeConfig, InterpreterLimits, EvaluatorLimits, DiscoveryConfig,
};

pub use crate::expr::{Expression, ExprError, ExpressionEvaluator, SafeEvaluator};

pub use crate::security::SecurityViolation;

pub use crate::effects::{
    EffectExpression, EffectOperation, TargetSelector, TargetKind, Timing, TimingKind,
    EffectInterpreter, ExecutionContext, EffectResult, InterpreterError, Severity,
    DeferredOperation, DeferredQueue,
};

pub use crate::validation::{ValidationPipeline, ValidationResult, ValidationStage};

pub use crate::evaluation::{EffectEvaluator, EvaluationReport, EvaluationScores};

pub use crate::blessing::{BlessingDecision, BlessingService, BlessingThresholds, ScoreCategory};

pub use crate::discovery::{
    EffectDiscovery, DiscoveryOutcome, DiscoveryRequest,
    LlmProvider, LlmRequest, LlmResponse, LlmError,
    SpellDefinition, SpellRegistry, InMemorySpellRegistry,
    RejectedEffectArtifact, ArtifactStore, InMemoryArtifactStore,
};
