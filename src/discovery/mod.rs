//! Discovery: turning model output into spells or artifacts.
//!
//! [`EffectDiscovery`] is the only asynchronous piece of the forge. It awaits
//! the [`LlmProvider`], then runs the synchronous validation, evaluation and
//! blessing stages and files the candidate:
//!
//! - blessed candidates become a [`SpellDefinition`] in the [`SpellRegistry`]
//! - everything else becomes a [`RejectedEffectArtifact`] in the [`ArtifactStore`]
//! - a response with no parseable effect is reported and nothing is filed
//!
//! ```
//! use effect_forge::discovery::extract_json;
//!
//! let reply = "Sure!\n```json\n{\"target\": {\"type\": \"self\"}}\n```";
//! assert_eq!(extract_json(reply), Some("{\"target\": {\"type\": \"self\"}}"));
//! ```

mod artifacts;
mod llm;
mod pipeline;
mod spell;

pub use artifacts::{danger_level, ArtifactStore, InMemoryArtifactStore, RejectedEffectArtifact, RejectionCategory};
pub use llm::{build_prompt, extract_json, parse_effect_json, LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use pipeline::{DiscoveryOutcome, DiscoveryRequest, EffectDiscovery};
pub use spell::{
    cast_time, infer_form, infer_technique, mana_cost, range, Form, InMemorySpellRegistry, SpellDefinition,
    SpellRegistry, Technique, GLOBAL_RANGE, SINGLE_TARGET_RANGE,
};
