//! Approve/reject decisions for evaluated effects.
//!
//! The decision ([`decide`]) is a pure comparison of scores against
//! [`BlessingThresholds`]: every category, including the weighted
//! overall, must meet its minimum. The first shortfall in the order
//! safety, balance, completeness, creativity, overall sets the rejection
//! theme.
//!
//! [`BlessingService`] wraps the decision in presentation: a deity chosen
//! by paradigm and a phrasing chosen through a [`PhrasePicker`].

mod decision;
pub mod phrases;
mod picker;
mod service;
mod thresholds;

pub use decision::{decide, BlessingDecision, Verdict, EXCEPTIONAL_OVERALL};
pub use picker::{FirstPhrase, PhrasePicker, SeededPicker};
pub use service::BlessingService;
pub use thresholds::{BlessingThresholds, ScoreCategory};
