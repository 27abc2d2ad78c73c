//! TEP Reactor Monitor - Core Service
//!
//! Leakage-safe dataset partitioning, the detector/diagnostician cascade,
//! a streaming fault monitor and the offline metrics aggregator.

pub mod api;
pub mod constants;
pub mod logic;
