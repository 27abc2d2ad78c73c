//! Service Commands - call surface for an external serving layer
//!
//! Transport-agnostic: every command takes the state it needs by
//! reference and reports failures as strings, ready to map onto HTTP.

use std::path::Path;

use crate::logic::dataset::FaultCode;
use crate::logic::evaluation::{self, EvaluationReport, FaultProfile};
use crate::logic::features::FeatureVector;
use crate::logic::model::{CascadePolicy, HealthStatus, InferenceResponse, Predictor, SensorPayload};
use crate::logic::monitor::{FinalReport, MonitorConfig, MonitorRegistry, MonitorSnapshot, SessionHandle};
use crate::logic::storage;

// ============================================================================
// INFERENCE COMMANDS
// ============================================================================

/// Single-sample cascade prediction
pub fn predict(policy: &CascadePolicy, payload: &SensorPayload) -> Result<InferenceResponse, String> {
    let vector = FeatureVector::from_named(&payload.sensors).map_err(|e| e.to_string())?;
    let prediction = policy.predict(&vector).map_err(|e| {
        log::error!("Inference error: {}", e);
        e.to_string()
    })?;
    Ok(InferenceResponse::from(prediction))
}

pub fn health(policy: &CascadePolicy) -> HealthStatus {
    policy.health()
}

// ============================================================================
// MONITOR COMMANDS
// ============================================================================

pub fn start_monitor(registry: &MonitorRegistry, config: MonitorConfig) -> Result<SessionHandle, String> {
    registry.start(config).map_err(|e| e.to_string())
}

/// Predict (fail-soft on transport) and feed one telemetry sample.
/// Other sessions stay responsive while the prediction is in flight.
pub fn feed_monitor(
    registry: &MonitorRegistry,
    predictor: &dyn Predictor,
    handle: SessionHandle,
    elapsed_time: f64,
    payload: &SensorPayload,
) -> Result<MonitorSnapshot, String> {
    let vector = FeatureVector::from_named(&payload.sensors).map_err(|e| e.to_string())?;
    registry
        .observe(handle, predictor, elapsed_time, vector)
        .map_err(|e| e.to_string())
}

pub fn stop_monitor(registry: &MonitorRegistry, handle: SessionHandle) -> Result<FinalReport, String> {
    registry.stop(handle).map_err(|e| e.to_string())
}

// ============================================================================
// REPORT COMMANDS
// ============================================================================

/// Performance profile of one fault from a persisted report
pub fn get_fault_profile(report_path: &Path, code: FaultCode) -> FaultProfile {
    match storage::load_json::<EvaluationReport>(report_path) {
        Ok(report) => evaluation::fault_profile(&report, code),
        Err(e) => {
            log::warn!("Metrics report unavailable at {:?}: {}", report_path, e);
            FaultProfile {
                fault_code: code,
                description: "Missing".to_string(),
                f1_score: 0.0,
                accuracy: 0.0,
                comment: "Evaluation report not found".to_string(),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::logic::dataset::{finalize, synthetic_dataset, synthetic_record};
    use crate::logic::model::{InferenceError, ModelStore, Prediction};
    use crate::logic::monitor::Phase;

    /// Remote model stuck near its timeout
    struct Stalled(Duration);

    impl Predictor for Stalled {
        fn predict(&self, _vector: &FeatureVector) -> Result<Prediction, InferenceError> {
            std::thread::sleep(self.0);
            Ok(Prediction::NORMAL)
        }
    }

    fn trained(dir: &Path) -> CascadePolicy {
        let mut policy = CascadePolicy::new(ModelStore::new(dir));
        let set = finalize(&synthetic_dataset(&[0, 3], 2, 5)).unwrap();
        policy.train(&set, true).unwrap();
        policy
    }

    #[test]
    fn test_predict_command() {
        let dir = tempfile::tempdir().unwrap();
        let policy = trained(dir.path());

        let payload = SensorPayload::from(&synthetic_record(3, 1, 1).features);
        let response = predict(&policy, &payload).unwrap();
        assert!(response.is_anomaly);
        assert_eq!(response.status, "Anomalous state detected: Fault 3");

        let mut partial = payload.clone();
        partial.sensors.remove("xmeas_1");
        assert!(predict(&policy, &partial).unwrap_err().contains("xmeas_1"));
        assert!(health(&policy).detector_ready);
    }

    #[test]
    fn test_monitor_commands() {
        let dir = tempfile::tempdir().unwrap();
        let policy = trained(dir.path());
        let registry = MonitorRegistry::new();

        let handle = start_monitor(&registry, MonitorConfig::for_fault(3)).unwrap();
        let payload = SensorPayload::from(&synthetic_record(0, 1, 1).features);
        let snapshot = feed_monitor(&registry, &policy, handle, 3.0, &payload).unwrap();
        assert_eq!(snapshot.phase, Phase::Calibrating);
        assert!(feed_monitor(&registry, &policy, handle, 3.0, &payload).is_err());

        let report = stop_monitor(&registry, handle).unwrap();
        assert_eq!(report.samples, 1);
        assert!(feed_monitor(&registry, &policy, handle, 6.0, &payload).is_err());
    }

    #[test]
    fn test_stalled_inference_does_not_block_other_sessions() {
        let registry = MonitorRegistry::new();
        let stalled = Stalled(Duration::from_millis(800));
        let payload = SensorPayload::from(&synthetic_record(0, 1, 1).features);
        let a = start_monitor(&registry, MonitorConfig::for_fault(3)).unwrap();
        let b = start_monitor(&registry, MonitorConfig::for_fault(3)).unwrap();

        std::thread::scope(|scope| {
            let slow_feed = scope.spawn(|| feed_monitor(&registry, &stalled, a, 3.0, &payload));
            std::thread::sleep(Duration::from_millis(100));

            let started = Instant::now();
            assert_eq!(registry.snapshot(b).unwrap().samples, 0);
            let stopped = stop_monitor(&registry, b).unwrap();
            let waited = started.elapsed();
            assert_eq!(stopped.samples, 0);
            assert!(waited < Duration::from_millis(300), "session b waited {:?}", waited);

            assert_eq!(slow_feed.join().unwrap().unwrap().samples, 1);
        });
    }

    #[test]
    fn test_fault_profile_without_report() {
        let dir = tempfile::tempdir().unwrap();
        let profile = get_fault_profile(&dir.path().join("metrics.json"), 4);
        assert_eq!(profile.description, "Missing");
    }
}
