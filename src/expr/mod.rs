//! Safe expression evaluation.
//!
//! A tiny, side-effect-free expression language used by effect programs
//! for amounts, counts and conditions:
//! - `Expression`: the untagged JSON syntax tree
//! - `VariableScope`: read-only variable lookup (`WorldScope` for the live world)
//! - `ExpressionEvaluator`: evaluation contract, with `SafeEvaluator` as
//!   the bounded default implementation
//!
//! Expressions can never mutate state and always reduce to a finite
//! number or a boolean.

mod ast;
mod error;
mod evaluator;
mod scope;

pub use ast::{BinaryOp, Expression, Value};
pub use error::ExprError;
pub use evaluator::{ExpressionEvaluator, SafeEvaluator};
pub use scope::{MapScope, VariableScope, WorldScope};
