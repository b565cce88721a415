//! Expression syntax tree.
//!
//! Expressions appear wherever an effect needs a number or a truth value:
//! damage amounts, repeat counts, conditions. The JSON shape is untagged:
//!
//! | JSON | Variant |
//! |---|---|
//! | `15`, `2.5` | `Number` |
//! | `true` | `Bool` |
//! | `"caster.intelligence"` | `Variable` |
//! | `{"op": "*", "left": .., "right": ..}` | `Binary` |
//! | `{"fn": "min", "args": [..]}` | `Call` |
//!
//! The operator of a binary node stays a string so that trees with an
//! unknown operator still decode; static analysis treats them as worst
//! case and the evaluator rejects them at runtime.

use serde::{Deserialize, Serialize};

/// An arithmetic/boolean expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Number(f64),
    Bool(bool),
    /// Dotted variable reference, e.g. `caster.intelligence`.
    Variable(String),
    Binary {
        op: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        #[serde(rename = "fn")]
        function: String,
        #[serde(default)]
        args: Vec<Expression>,
    },
}

impl Expression {
    /// A numeric literal.
    pub fn num(value: f64) -> Self {
        Self::Number(value)
    }

    /// A variable reference.
    pub fn var(path: impl Into<String>) -> Self {
        Self::Variable(path.into())
    }

    /// A binary node.
    pub fn binary(op: impl Into<String>, left: Expression, right: Expression) -> Self {
        Self::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A function call node.
    pub fn call(function: impl Into<String>, args: impl IntoIterator<Item = Expression>) -> Self {
        Self::Call {
            function: function.into(),
            args: args.into_iter().collect(),
        }
    }

    /// The literal number, if this is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

/// Recognized binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Parse an operator token. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "**" => Self::Pow,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }

    /// Arithmetic operators produce numbers; the rest produce booleans.
    #[must_use]
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Rem | Self::Pow
        )
    }
}

/// The result of evaluating an expression.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    /// Numeric view. Booleans coerce to 1/0.
    #[must_use]
    pub fn as_number(self) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
        }
    }

    /// Truth view. Numbers are true when non-zero.
    #[must_use]
    pub fn is_truthy(self) -> bool {
        match self {
            Self::Number(n) => n != 0.0,
            Self::Bool(b) => b,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
        }
    }
}
