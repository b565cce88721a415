//! Deferred operations.
//!
//! `delay` never runs its body inline. The interpreter hands back a
//! [`DeferredOperation`] and the host decides when time passes, typically
//! by keeping a [`DeferredQueue`] and draining it once per tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::EntityId;

use super::EffectOperation;

/// Longest delay a body can ask for. Larger requests are clamped.
pub const MAX_DELAY_TICKS: u64 = u32::MAX as u64;

/// A body captured by `delay`, with the context it was captured in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeferredOperation {
    /// Requested delay.
    pub ticks: u64,
    /// Tick at which the body becomes due.
    pub due_tick: u64,
    pub operations: Vec<EffectOperation>,
    pub caster: EntityId,
    pub target: EntityId,
    /// Nesting depth the body runs at.
    pub depth: u32,
}

/// Caller-owned queue of deferred bodies, ordered by due tick.
///
/// Entries due on the same tick come back in insertion order.
#[derive(Clone, Debug, Default)]
pub struct DeferredQueue {
    pending: BTreeMap<(u64, u64), DeferredOperation>,
    sequence: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one deferred body.
    pub fn schedule(&mut self, deferred: DeferredOperation) {
        self.pending.insert((deferred.due_tick, self.sequence), deferred);
        self.sequence += 1;
    }

    /// Queue everything an execution deferred.
    pub fn schedule_all(&mut self, deferred: impl IntoIterator<Item = DeferredOperation>) {
        for entry in deferred {
            self.schedule(entry);
        }
    }

    /// Remove and return every entry due at or before `tick`.
    pub fn drain_due(&mut self, tick: u64) -> Vec<DeferredOperation> {
        let later = match tick.checked_add(1) {
            Some(next) => self.pending.split_off(&(next, 0)),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.pending, later);
        due.into_values().collect()
    }

    /// Due tick of the earliest entry.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().map(|(tick, _)| *tick)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
