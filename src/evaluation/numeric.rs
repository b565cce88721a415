//! Conservative static extraction of numeric values.
//!
//! Static analysis cannot know what `caster.intelligence` will be at cast
//! time, so anything it cannot fold is assumed to be as bad as it can
//! plausibly get.

use crate::expr::Expression;

/// Assumed value for anything that cannot be folded.
pub const WORST_CASE: f64 = 10_000.0;

/// Estimate an expression's value without a scope.
///
/// Literals are taken as-is and binary `+ - * / **` nodes are folded
/// recursively. Variables, calls, booleans and any other operator
/// evaluate to [`WORST_CASE`]. Folding may produce a non-finite result
/// (division by zero); callers treat that as a violation.
#[must_use]
pub fn conservative_value(expr: &Expression) -> f64 {
    match expr {
        Expression::Number(n) => *n,
        Expression::Binary { op, left, right } => {
            let (l, r) = (conservative_value(left), conservative_value(right));
            match op.as_str() {
                "+" => l + r,
                "-" => l - r,
                "*" => l * r,
                "/" => l / r,
                "**" => l.powf(r),
                _ => WORST_CASE,
            }
        }
        _ => WORST_CASE,
    }
}
