//! Evaluation Module - Metrics Aggregator
//!
//! Scores the cascade against an archived test set and caches the
//! classification report under the test set's content hash.

pub mod evaluator;
pub mod render;
pub mod report;

#[cfg(test)]
mod tests;

pub use evaluator::{evaluate, report_path, test_set_identity};
pub use render::{fault_profile, render, FaultProfile};
pub use report::{classification_report, ClassMetrics, EvaluationReport};
