//! Interpreter errors and their severity.
//!
//! Every failure carries its class natively: [`InterpreterError::severity`]
//! is an exhaustive match, so adding a variant forces a decision about
//! whether it aborts the whole run.

use crate::core::EntityId;
use crate::expr::ExprError;
use crate::security::SecurityViolation;

/// How a failure propagates out of `execute`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Abort the run and return `Err` to the caller.
    Critical,
    /// Stop gracefully; the message lands in `EffectResult::error`
    /// alongside whatever already happened.
    Recoverable,
}

/// A failure during effect execution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpreterError {
    #[error("Maximum operation limit exceeded ({limit})")]
    OperationLimit { limit: u32 },

    #[error("Maximum depth limit exceeded ({limit})")]
    DepthLimit { limit: u32 },

    #[error("Maximum chain depth limit exceeded ({limit})")]
    ChainDepthLimit { limit: u32 },

    #[error("Execution timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error(transparent)]
    Security(#[from] SecurityViolation),

    #[error("Invalid stat: {0}")]
    InvalidStat(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Invalid teleport destination ({x}, {y})")]
    InvalidDestination { x: f64, y: f64 },

    #[error("Negative {operation} count: {count}")]
    NegativeCount { operation: &'static str, count: f64 },

    #[error("Expression error: {0}")]
    Expression(#[from] ExprError),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("{entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },
}

impl InterpreterError {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::OperationLimit { .. }
            | Self::DepthLimit { .. }
            | Self::ChainDepthLimit { .. }
            | Self::Timeout { .. }
            | Self::Security(_)
            | Self::InvalidStat(_)
            | Self::InvalidStatus(_)
            | Self::InvalidEntityType(_)
            | Self::InvalidMaterial(_)
            | Self::InvalidDestination { .. }
            | Self::NegativeCount { .. } => Severity::Critical,
            Self::Expression(inner) if inner.is_critical() => Severity::Critical,
            Self::Expression(_) | Self::EntityNotFound(_) | Self::MissingComponent { .. } => {
                Severity::Recoverable
            }
        }
    }

    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity() == Severity::Critical
    }
}
