//! Feature Vector - Core data structure for classifier input
//!
//! **Versioned channel vector with layout validation**
//!
//! Uses centralized layout from `layout.rs` for:
//! - Consistent channel ordering
//! - Version tracking
//! - Layout hash for compatibility checks

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::layout::{
    feature_index, layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT,
    FEATURE_LAYOUT, FEATURE_VERSION,
};
use crate::logic::error::{PipelineError, PipelineResult};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned channel vector with layout metadata
///
/// All telemetry flows through this type. Never hand raw `Vec<f32>` to a
/// classifier: the layout hash is what catches reordered channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Channel layout version
    pub version: u8,
    /// CRC32 hash of the channel layout
    pub layout_hash: u32,
    /// Channel values in order defined by FEATURE_LAYOUT
    values: Vec<f32>,
}

impl FeatureVector {
    /// Create from channel-ordered values
    pub fn from_values(values: Vec<f32>) -> PipelineResult<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(PipelineError::Schema(format!(
                "expected {} channels, got {}",
                FEATURE_COUNT,
                values.len()
            )));
        }
        Ok(Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        })
    }

    /// Build from a name → value mapping (inference payload).
    ///
    /// All 52 channels are required and unknown names are rejected;
    /// the error lists both sets so the caller can fix the payload.
    pub fn from_named(sensors: &HashMap<String, f32>) -> PipelineResult<Self> {
        let missing: Vec<&str> = FEATURE_LAYOUT
            .iter()
            .filter(|name| !sensors.contains_key(name.as_str()))
            .map(|name| name.as_str())
            .collect();
        let mut unexpected: Vec<&str> = sensors
            .keys()
            .filter(|name| feature_index(name).is_none())
            .map(|name| name.as_str())
            .collect();
        unexpected.sort_unstable();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(PipelineError::Schema(format!(
                "channel set mismatch (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                unexpected.join(", ")
            )));
        }

        let mut values = Vec::with_capacity(FEATURE_COUNT);
        for name in FEATURE_LAYOUT.iter() {
            let value = sensors[name.as_str()];
            if !value.is_finite() {
                return Err(PipelineError::Schema(format!("channel {} is not finite", name)));
            }
            values.push(value);
        }

        Self::from_values(values)
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Get channel by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get channel by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Set channel by name
    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        match feature_index(name) {
            Some(index) => {
                self.values[index] = value;
                true
            }
            None => false,
        }
    }

    /// Name → value view, ordered by name (wire format for remote inference)
    pub fn to_named(&self) -> BTreeMap<String, f32> {
        FEATURE_LAYOUT
            .iter()
            .cloned()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)?;
        if self.values.len() != FEATURE_COUNT {
            return Err(LayoutMismatchError {
                expected_version: FEATURE_VERSION,
                expected_hash: layout_hash(),
                actual_version: self.version,
                actual_hash: self.layout_hash,
            });
        }
        Ok(())
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values: vec![0.0; FEATURE_COUNT],
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
