//! Expression evaluation errors.

/// Failure while evaluating an [`Expression`](super::Expression).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Expression depth limit exceeded ({0})")]
    DepthExceeded(u32),

    #[error("Expression operation limit exceeded ({0})")]
    OperationLimit(u32),

    #[error("Expression produced a non-finite result")]
    NonFinite,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Function {function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,
}

impl ExprError {
    /// Errors that indicate a hostile or broken program rather than an
    /// unlucky runtime value.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        match self {
            Self::UndefinedVariable(_)
            | Self::DepthExceeded(_)
            | Self::OperationLimit(_)
            | Self::NonFinite => true,
            Self::UnknownFunction(_)
            | Self::UnknownOperator(_)
            | Self::Arity { .. }
            | Self::DivisionByZero => false,
        }
    }
}
