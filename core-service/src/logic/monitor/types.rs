use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_INJECTION_TIME, DEFAULT_STABILIZATION_TIME, MAX_FAULT_CODE};
use crate::logic::dataset::FaultCode;
use crate::logic::features::{feature_index, FeatureVector, FLOW_CHANNEL, PRESSURE_CHANNEL, TEMPERATURE_CHANNEL};
use crate::logic::model::Prediction;

// ============================================================================
// CONFIG
// ============================================================================

/// Per-session monitor parameters, fixed at `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub injection_time: f64,
    pub target_fault_code: FaultCode,
    pub calibration_size: usize,
    pub persistence_threshold: u32,
    pub deviation_tolerance: f64,
    /// Diagnosis output is shown as 0 before this elapsed time
    pub stabilization_time: f64,
    pub channels: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            injection_time: DEFAULT_INJECTION_TIME,
            target_fault_code: 1,
            calibration_size: 5,
            persistence_threshold: 2,
            deviation_tolerance: 0.02,
            stabilization_time: DEFAULT_STABILIZATION_TIME,
            channels: vec![
                PRESSURE_CHANNEL.to_string(),
                TEMPERATURE_CHANNEL.to_string(),
                FLOW_CHANNEL.to_string(),
            ],
        }
    }
}

impl MonitorConfig {
    pub fn for_fault(target_fault_code: FaultCode) -> Self {
        Self {
            target_fault_code,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        let invalid = |msg: String| Err(MonitorError::InvalidConfig(msg));

        if !self.injection_time.is_finite() || self.injection_time < 0.0 {
            return invalid(format!("injection time {} must be finite and >= 0", self.injection_time));
        }
        if self.target_fault_code == 0 || self.target_fault_code > MAX_FAULT_CODE {
            return invalid(format!(
                "target fault {} outside 1..={}",
                self.target_fault_code, MAX_FAULT_CODE
            ));
        }
        if self.calibration_size == 0 {
            return invalid("calibration size must be at least 1".to_string());
        }
        if self.persistence_threshold == 0 {
            return invalid("persistence threshold must be at least 1".to_string());
        }
        if !(self.deviation_tolerance.is_finite() && self.deviation_tolerance >= 0.0) {
            return invalid(format!("deviation tolerance {} must be >= 0", self.deviation_tolerance));
        }
        if self.channels.is_empty() {
            return invalid("at least one monitored channel is required".to_string());
        }
        if let Some(unknown) = self.channels.iter().find(|c| feature_index(c).is_none()) {
            return invalid(format!("unknown channel {}", unknown));
        }
        Ok(())
    }
}

// ============================================================================
// SESSION DATA
// ============================================================================

/// Opaque session identifier handed out by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Init,
    Calibrating,
    Monitoring,
    Ended,
}

/// One fed sample. `prediction: None` marks a degraded (neutral) sample.
#[derive(Debug, Clone)]
pub struct Sample {
    pub elapsed_time: f64,
    pub values: FeatureVector,
    pub prediction: Option<Prediction>,
}

impl Sample {
    pub fn new(elapsed_time: f64, values: FeatureVector, prediction: Prediction) -> Self {
        Self {
            elapsed_time,
            values,
            prediction: Some(prediction),
        }
    }

    pub fn degraded(elapsed_time: f64, values: FeatureVector) -> Self {
        Self {
            elapsed_time,
            values,
            prediction: None,
        }
    }
}

/// Timeline entry, one per fed sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub elapsed_time: f64,
    pub channels: BTreeMap<String, f32>,
    pub is_anomaly: bool,
    pub fault_code: FaultCode,
    pub display_code: FaultCode,
    pub degraded: bool,
    pub deviations: BTreeMap<String, bool>,
}

/// State returned by every `feed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub phase: Phase,
    pub detected: bool,
    pub confirmed: bool,
    pub onset_time: Option<f64>,
    pub confirmation_time: Option<f64>,
    pub consecutive_matches: u32,
    pub samples: usize,
    pub baseline: Option<BTreeMap<String, f64>>,
    pub last: Option<TimelinePoint>,
}

/// Frozen outcome of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub target_fault_code: FaultCode,
    pub injection_time: f64,
    pub onset_time: Option<f64>,
    pub confirmation_time: Option<f64>,
    pub detection_delay: Option<f64>,
    pub diagnosis_delay: Option<f64>,
    pub samples: usize,
    pub degraded_samples: usize,
    pub baseline: Option<BTreeMap<String, f64>>,
    pub timeline: Vec<TimelinePoint>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error("unknown monitor session {0}")]
    UnknownSession(SessionHandle),

    #[error("monitor session has ended")]
    SessionEnded,

    #[error("sample at t={received} is not after previous sample (t={previous:?})")]
    OutOfOrder { previous: Option<f64>, received: f64 },

    #[error("invalid monitor config: {0}")]
    InvalidConfig(String),

    /// The local cascade cannot serve (missing artifacts, schema mismatch)
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}
