//! Effect programs and their bounded execution.
//!
//! - [`EffectExpression`] / [`EffectOperation`]: the program tree
//! - [`TargetSelector`]: who an effect (or a chain) lands on
//! - [`EffectInterpreter`]: walks a tree against the live [`World`](crate::core::World)
//! - [`InterpreterError`]: failures, each tagged critical or recoverable
//! - [`DeferredQueue`]: host-side holding pen for `delay` bodies
//!
//! Stat, status, archetype and material names are checked against the
//! fixed vocabularies in [`vocab`] at execution time, so a tree that slips
//! past validation still cannot write arbitrary keys.

mod effect;
mod error;
mod interpreter;
mod result;
mod scheduler;
mod targeting;
pub mod vocab;

pub use effect::{Condition, DecodeError, EffectExpression, EffectOperation, Location, Timing, TimingKind};
pub use error::{InterpreterError, Severity};
pub use interpreter::{EffectInterpreter, ExecutionContext, CONDITIONS_NOT_MET, DEFAULT_STATUS_DURATION};
pub use result::{EffectResult, EmittedEvent};
pub use scheduler::{DeferredOperation, DeferredQueue, MAX_DELAY_TICKS};
pub use targeting::{SelectionContext, TargetFilter, TargetKind, TargetSelector, Targets, DEFAULT_RADIUS};
