//! Fail-soft stream driver: inference per sample, degraded on failure.

use super::session::MonitorSession;
use super::types::{FinalReport, MonitorConfig, MonitorError, MonitorSnapshot, Sample};
use crate::constants::SAMPLE_INTERVAL;
use crate::logic::dataset::SourceRecord;
use crate::logic::features::FeatureVector;
use crate::logic::model::{InferenceError, Predictor};

/// Elapsed time of a 1-based TEP sample index
pub fn elapsed_from_sample(sample_index: u32) -> f64 {
    sample_index as f64 * SAMPLE_INTERVAL
}

/// Run inference for one sample. Transport, status and decode failures
/// give a neutral sample; a broken local model is an error.
pub fn infer(predictor: &dyn Predictor, elapsed_time: f64, values: FeatureVector) -> Result<Sample, MonitorError> {
    match predictor.predict(&values) {
        Ok(prediction) => Ok(Sample::new(elapsed_time, values, prediction)),
        Err(InferenceError::Model(msg)) => {
            log::error!("Model cannot serve sample at t={}: {}", elapsed_time, msg);
            Err(MonitorError::ModelUnavailable(msg))
        }
        Err(e) => {
            log::warn!("Inference unavailable at t={}, recording neutral sample: {}", elapsed_time, e);
            Ok(Sample::degraded(elapsed_time, values))
        }
    }
}

/// Predict then feed
pub fn observe(
    session: &mut MonitorSession,
    predictor: &dyn Predictor,
    elapsed_time: f64,
    values: FeatureVector,
) -> Result<MonitorSnapshot, MonitorError> {
    session.feed(infer(predictor, elapsed_time, values)?)
}

/// Drive a full stream through a fresh session; exhaustion ends it
pub fn replay<I>(config: MonitorConfig, predictor: &dyn Predictor, samples: I) -> Result<FinalReport, MonitorError>
where
    I: IntoIterator<Item = (f64, FeatureVector)>,
{
    let mut session = MonitorSession::new(config)?;
    for (elapsed_time, values) in samples {
        observe(&mut session, predictor, elapsed_time, values)?;
    }
    Ok(session.stop())
}

/// Replay the rows of one simulation run in sample order
pub fn replay_run(
    config: MonitorConfig,
    predictor: &dyn Predictor,
    records: &[SourceRecord],
) -> Result<FinalReport, MonitorError> {
    let mut rows: Vec<&SourceRecord> = records.iter().collect();
    rows.sort_by_key(|r| r.sample_index);
    replay(
        config,
        predictor,
        rows.into_iter()
            .map(|r| (elapsed_from_sample(r.sample_index), r.features.clone())),
    )
}
