//! Logic Module - Engines
//!
//! - `features/` - 52-channel layout contract and versioned vectors
//! - `dataset/` - source records, run-aware Partitioner, JSONL store
//! - `model/` - Cascade Policy and inference adapters
//! - `monitor/` - streaming detection state machine
//! - `evaluation/` - Metrics Aggregator

// Shared infrastructure
pub mod config;
pub mod error;
pub mod storage;

// Engines
pub mod dataset;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod monitor;
pub mod pipeline;

pub use error::{PipelineError, PipelineResult};
