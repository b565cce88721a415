//! Configuration types.
//!
//! Every stage reads its bounds from a plain serde struct with sensible
//! defaults. Hosts either build them in code with the `with_*` builders
//! or load a [`ForgeConfig`] from JSON:
//!
//! ```
//! use effect_forge::core::ForgeConfig;
//!
//! let config = ForgeConfig::from_json_str(r#"{ "limits": { "maxDepth": 4 } }"#).unwrap();
//! assert_eq!(config.limits.max_depth, 4);
//! assert_eq!(config.limits.max_operations, 1000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::blessing::BlessingThresholds;

/// Hard resource bounds for one interpreter run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpreterLimits {
    /// Maximum nesting depth of operation bodies.
    pub max_depth: u32,

    /// Maximum operations executed across the whole run.
    pub max_operations: u32,

    /// Maximum distinct entities an effect may touch.
    /// Exceeding it silently skips further operations.
    pub max_entities_affected: usize,

    /// Cap on cumulative damage dealt in one run.
    pub max_damage_per_effect: f64,

    /// Cap on cumulative spawns in one run.
    pub max_spawns_per_effect: u32,

    /// Maximum chain fan-out (new-target executions) in one run.
    pub max_chain_depth: u32,

    /// Wall-clock budget, checked cooperatively per operation.
    /// `None` = unbounded.
    pub timeout_ms: Option<u64>,
}

impl Default for InterpreterLimits {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_operations: 1000,
            max_entities_affected: 100,
            max_damage_per_effect: 10_000.0,
            max_spawns_per_effect: 50,
            max_chain_depth: 5,
            timeout_ms: None,
        }
    }
}

impl InterpreterLimits {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_operations(mut self, operations: u32) -> Self {
        self.max_operations = operations;
        self
    }

    pub fn with_max_entities(mut self, entities: usize) -> Self {
        self.max_entities_affected = entities;
        self
    }

    pub fn with_max_damage(mut self, damage: f64) -> Self {
        self.max_damage_per_effect = damage;
        self
    }

    pub fn with_max_spawns(mut self, spawns: u32) -> Self {
        self.max_spawns_per_effect = spawns;
        self
    }

    pub fn with_max_chain_depth(mut self, depth: u32) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The timeout as a `Duration`, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Bounds for the expression evaluator itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluatorLimits {
    /// Maximum expression nesting depth.
    pub max_depth: u32,
    /// Maximum nodes evaluated between resets.
    pub max_operations: u32,
}

impl Default for EvaluatorLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_operations: 10_000,
        }
    }
}

/// Settings for the generation stage of discovery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// Sampling temperature passed to the LLM.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Stop sequences passed to the LLM.
    pub stop_sequences: Vec<String>,
    /// Seed for blessing flavor text.
    pub flavor_seed: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            stop_sequences: Vec::new(),
            flavor_seed: 42,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_flavor_seed(mut self, seed: u64) -> Self {
        self.flavor_seed = seed;
        self
    }
}

/// Complete configuration for the forge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub limits: InterpreterLimits,
    pub evaluator: EvaluatorLimits,
    pub thresholds: BlessingThresholds,
    pub discovery: DiscoveryConfig,
}

impl ForgeConfig {
    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = InterpreterLimits::default();
        assert_eq!(limits.max_depth, 10);
        assert_eq!(limits.max_operations, 1000);
        assert_eq!(limits.max_entities_affected, 100);
        assert_eq!(limits.max_damage_per_effect, 10_000.0);
        assert_eq!(limits.max_spawns_per_effect, 50);
        assert_eq!(limits.max_chain_depth, 5);
        assert!(limits.timeout().is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let limits = InterpreterLimits::default()
            .with_max_depth(3)
            .with_max_operations(20)
            .with_timeout(Duration::from_millis(250));

        assert_eq!(limits.max_depth, 3);
        assert_eq!(limits.max_operations, 20);
        assert_eq!(limits.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = ForgeConfig::from_json_str(
            r#"{ "limits": { "maxChainDepth": 2 }, "discovery": { "temperature": 0.2 } }"#,
        )
        .unwrap();

        assert_eq!(config.limits.max_chain_depth, 2);
        assert_eq!(config.limits.max_spawns_per_effect, 50);
        assert_eq!(config.discovery.temperature, 0.2);
        assert_eq!(config.discovery.max_tokens, 1024);
        assert_eq!(config.thresholds, BlessingThresholds::default());
    }

    #[test]
    fn test_serialization() {
        let config = ForgeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ForgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
