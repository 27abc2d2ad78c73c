//! Channel Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add channel → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove channel → increment FEATURE_VERSION
//!
//! Classifiers, persisted artifacts and inference requests all bind to
//! this order. A reordered vector is silently misclassified, so every
//! boundary checks the layout hash.

use crc32fast::Hasher;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current channel layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// CHANNEL LAYOUT (Authoritative source)
// ============================================================================

/// Number of measured process variables (`xmeas_*`)
pub const MEASURED_COUNT: usize = 41;

/// Number of manipulated variables (`xmv_*`)
pub const MANIPULATED_COUNT: usize = 11;

/// Total number of channels
pub const FEATURE_COUNT: usize = MEASURED_COUNT + MANIPULATED_COUNT;

/// Channel names in exact order: xmeas_1..xmeas_41 then xmv_1..xmv_11
pub static FEATURE_LAYOUT: Lazy<Vec<String>> = Lazy::new(|| {
    (1..=MEASURED_COUNT)
        .map(|i| format!("xmeas_{}", i))
        .chain((1..=MANIPULATED_COUNT).map(|i| format!("xmv_{}", i)))
        .collect()
});

/// Reactor pressure (kPa gauge)
pub const PRESSURE_CHANNEL: &str = "xmeas_7";
/// Reactor temperature (deg C)
pub const TEMPERATURE_CHANNEL: &str = "xmeas_9";
/// Purge rate
pub const FLOW_CHANNEL: &str = "xmeas_10";

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the channel layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT.iter() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

static LAYOUT_HASH: Lazy<u32> = Lazy::new(compute_layout_hash);

/// Get layout hash (cached)
pub fn layout_hash() -> u32 {
    *LAYOUT_HASH
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout contract embedded in every persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.clone(),
        }
    }

    /// Validate against the compiled-in layout, names included
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.hash)?;
        if self.feature_names.as_slice() != FEATURE_LAYOUT.as_slice() {
            return Err(LayoutMismatchError {
                expected_version: FEATURE_VERSION,
                expected_hash: layout_hash(),
                actual_version: self.version,
                actual_hash: self.hash,
            });
        }
        Ok(())
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when channel layout doesn't match expected
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Channel layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get channel index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|n| n == name)
}

/// Get channel name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).map(|s| s.as_str())
}

// ============================================================================
// TESTS
// ============================================================================
