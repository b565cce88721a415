//! Execution results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::EntityId;

use super::DeferredOperation;

/// An event raised by `emit_event`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedEvent {
    pub event_type: String,
    pub source: EntityId,
    pub target: EntityId,
    pub tick: u64,
    pub payload: BTreeMap<String, serde_json::Value>,
}

/// What one `execute` call did.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectResult {
    pub success: bool,
    /// Why nothing happened, for non-error no-ops (`conditions_not_met`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// A recoverable failure that ended the run early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Distinct entities touched, in first-touch order.
    pub affected_entities: Vec<EntityId>,
    pub damage_dealt: f64,
    pub healing_done: f64,
    pub spawned: u32,
    pub spawned_entities: Vec<EntityId>,
    pub events: Vec<EmittedEvent>,
    /// New-target executions performed by `chain_effect`.
    pub chain_count: u32,
    pub operations_executed: u32,
    /// Bodies captured by `delay`, for the host scheduler.
    pub deferred: Vec<DeferredOperation>,
}

impl EffectResult {
    /// A successful run that touched nothing.
    pub fn empty() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A no-op with an explanation.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}
