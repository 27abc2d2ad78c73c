//! Offline evaluator with a report cache keyed by test-set identity.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::report::{classification_report, EvaluationReport};
use crate::logic::dataset::SourceRecord;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::model::CascadePolicy;
use crate::logic::storage;

/// SHA-256 (hex) over the JSONL serialization of the test records
pub fn test_set_identity(records: &[SourceRecord]) -> PipelineResult<String> {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(serde_json::to_vec(record)?);
        hasher.update(b"\n");
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Cached report location for a given identity
pub fn report_path(reports_dir: &Path, identity: &str) -> PathBuf {
    let short = identity.get(..16).unwrap_or(identity);
    reports_dir.join(format!("metrics-{}.json", short))
}

/// Return the cached report for `test`, or compute, publish and return it
pub fn evaluate(
    test: &[SourceRecord],
    policy: &CascadePolicy,
    reports_dir: &Path,
    force: bool,
) -> PipelineResult<EvaluationReport> {
    if test.is_empty() {
        return Err(PipelineError::Configuration(
            "cannot evaluate on an empty test set".to_string(),
        ));
    }

    let identity = test_set_identity(test)?;
    let path = report_path(reports_dir, &identity);

    if !force {
        match storage::load_json::<EvaluationReport>(&path) {
            Ok(report) => {
                log::info!("Metrics cache hit at {:?}", path);
                return Ok(report);
            }
            Err(PipelineError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    log::info!("Computing metrics for {} test rows (cascade)", test.len());
    let mut y_true = Vec::with_capacity(test.len());
    let mut y_pred = Vec::with_capacity(test.len());
    for record in test {
        y_true.push(record.fault_class);
        y_pred.push(policy.predict(&record.features)?.fault_code);
    }

    let report = classification_report(&y_true, &y_pred);
    storage::publish_json(&path, &report)?;
    log::info!(
        "Metrics saved to {:?} (accuracy {:.4})",
        path,
        report.accuracy
    );
    Ok(report)
}
