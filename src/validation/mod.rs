//! Pre-admission checks for candidate effects.
//!
//! See [`ValidationPipeline`] for the stage order.

mod pipeline;
mod schema;

pub use pipeline::{ValidationIssue, ValidationPipeline, ValidationResult, ValidationStage};
pub use schema::{schema_gaps, EMPTY_OPERATIONS};
