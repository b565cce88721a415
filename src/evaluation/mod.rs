//! Static quality scoring of effect trees.
//!
//! | Metric | Weight | Penalty per finding |
//! |---|---|---|
//! | safety | 0.3 | 0.25 |
//! | balance | 0.2 | 0.15 |
//! | completeness | 0.3 | 0.2 |
//! | creativity | 0.2 | points out of 5 |
//!
//! Nothing here executes the effect. Values that cannot be folded
//! statically are assumed to be worst case (see [`conservative_value`]).
//!
//! ```
//! use effect_forge::evaluation::EffectEvaluator;
//! use serde_json::json;
//!
//! let report = EffectEvaluator::default().evaluate_value(&json!({
//!     "target": {"type": "single"},
//!     "operations": [{"op": "deal_damage", "damageType": "fire", "amount": 15000}],
//!     "timing": {"type": "immediate"}
//! }));
//! assert!(!report.passed);
//! assert_eq!(report.scores.safety, 0.75);
//! ```

mod evaluator;
pub mod metrics;
mod numeric;

pub use evaluator::{
    EffectEvaluator, EvaluationReport, EvaluationScores, BALANCE_WEIGHT, COMPLETENESS_WEIGHT,
    CREATIVITY_WEIGHT, SAFETY_WEIGHT,
};
pub use metrics::MetricResult;
pub use numeric::{conservative_value, WORST_CASE};
