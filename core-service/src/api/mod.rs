//! API Module
//!
//! Organized with versioning for backward compatibility.
//!
//! Structure:
//! - commands.rs: Current stable API implementation
//! - v1/mod.rs: Re-exports commands as v1 API
//!
//! Usage:
//! - `api::commands::predict()` - Direct access
//! - `api::v1::predict()` - Version 1 API

pub mod commands;
pub mod v1;

// Re-export current version as default
pub use commands::*;
