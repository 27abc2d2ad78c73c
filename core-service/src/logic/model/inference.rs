//! Inference adapters - local cascade or remote prediction service
//!
//! The streaming monitor only sees `Predictor`. Remote calls are bounded
//! by a short timeout; callers decide how to degrade on `InferenceError`.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cascade::{CascadePolicy, Prediction};
use crate::constants::{self, MAX_FAULT_CODE};
use crate::logic::dataset::FaultCode;
use crate::logic::features::FeatureVector;

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Inference request body: channel name → value, all 52 channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPayload {
    pub sensors: HashMap<String, f32>,
}

impl From<&FeatureVector> for SensorPayload {
    fn from(vector: &FeatureVector) -> Self {
        Self {
            sensors: vector.to_named().into_iter().collect(),
        }
    }
}

/// Inference response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub is_anomaly: bool,
    pub fault_code: FaultCode,
    pub status: String,
}

impl From<Prediction> for InferenceResponse {
    fn from(prediction: Prediction) -> Self {
        let status = if prediction.is_anomaly {
            format!("Anomalous state detected: Fault {}", prediction.fault_code)
        } else {
            "Normal Operation".to_string()
        };
        Self {
            is_anomaly: prediction.is_anomaly,
            fault_code: if prediction.is_anomaly { prediction.fault_code } else { 0 },
            status,
        }
    }
}

impl InferenceResponse {
    fn into_prediction(self) -> Result<Prediction, InferenceError> {
        if self.fault_code > MAX_FAULT_CODE {
            return Err(InferenceError::InvalidFaultCode(self.fault_code));
        }
        Ok(Prediction {
            is_anomaly: self.is_anomaly,
            fault_code: if self.is_anomaly { self.fault_code } else { 0 },
        })
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("prediction service returned HTTP {0}")]
    Http(u16),

    /// Timeout, refused connection, DNS failure
    #[error("transport error: {0}")]
    Transport(String),

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("fault code {0} outside 0..=20")]
    InvalidFaultCode(FaultCode),

    /// Local cascade rejected the vector or has no artifacts
    #[error("model error: {0}")]
    Model(String),
}

// ============================================================================
// PREDICTORS
// ============================================================================

/// Source of per-sample predictions for a monitor stream
pub trait Predictor {
    fn predict(&self, vector: &FeatureVector) -> Result<Prediction, InferenceError>;
}

impl Predictor for CascadePolicy {
    fn predict(&self, vector: &FeatureVector) -> Result<Prediction, InferenceError> {
        CascadePolicy::predict(self, vector).map_err(|e| InferenceError::Model(e.to_string()))
    }
}

/// HTTP client for an external prediction service (`POST {url}/predict`)
pub struct RemotePredictor {
    endpoint: String,
    agent: ureq::Agent,
}

impl RemotePredictor {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: format!("{}/predict", base_url.trim_end_matches('/')),
            agent,
        }
    }

    /// Client configured from `INFERENCE_URL` / `INFERENCE_TIMEOUT_MS`
    pub fn from_env() -> Self {
        Self::new(
            &constants::get_inference_url(),
            Duration::from_millis(constants::get_inference_timeout_ms()),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Predictor for RemotePredictor {
    fn predict(&self, vector: &FeatureVector) -> Result<Prediction, InferenceError> {
        let body = serde_json::to_string(&SensorPayload::from(vector))
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body);

        match response {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| InferenceError::Decode(e.to_string()))?;
                let parsed: InferenceResponse =
                    serde_json::from_str(&text).map_err(|e| InferenceError::Decode(e.to_string()))?;
                parsed.into_prediction()
            }
            Err(ureq::Error::Status(code, _)) => Err(InferenceError::Http(code)),
            Err(e) => Err(InferenceError::Transport(e.to_string())),
        }
    }
}
