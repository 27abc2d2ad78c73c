use super::*;
use crate::logic::dataset::{finalize, synthetic_dataset};
use crate::logic::error::PipelineError;
use crate::logic::model::{CascadePolicy, ModelStore};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn sample_report() -> EvaluationReport {
    classification_report(&[0, 0, 1, 1, 2], &[0, 1, 1, 1, 0])
}

#[test]
fn test_per_class_metrics() {
    let report = sample_report();

    let c0 = report.class(0).unwrap();
    assert!(close(c0.precision, 0.5) && close(c0.recall, 0.5) && close(c0.f1_score, 0.5));
    assert_eq!(c0.support, 2);

    let c1 = report.class(1).unwrap();
    assert!(close(c1.precision, 2.0 / 3.0));
    assert!(close(c1.recall, 1.0));
    assert!(close(c1.f1_score, 0.8));

    // Never predicted: zero division yields 0
    let c2 = report.class(2).unwrap();
    assert_eq!((c2.precision, c2.recall, c2.f1_score), (0.0, 0.0, 0.0));

    assert!(close(report.accuracy, 0.6));
    assert!(close(report.macro_avg.f1_score, 1.3 / 3.0));
    assert!(close(report.weighted_avg.f1_score, 0.52));
    assert_eq!(report.weighted_avg.support, 5);
}

#[test]
fn test_report_json_shape() {
    let value = serde_json::to_value(sample_report()).unwrap();
    let object = value.as_object().unwrap();

    assert!(object.contains_key("accuracy"));
    assert!(object.contains_key("macro avg"));
    assert!(object.contains_key("weighted avg"));
    assert!(object["1"]["f1-score"].is_number());

    let back: EvaluationReport = serde_json::from_value(value).unwrap();
    assert_eq!(back, sample_report());
}

#[test]
fn test_empty_columns() {
    let report = classification_report(&[], &[]);
    assert!(report.classes.is_empty());
    assert_eq!(report.accuracy, 0.0);
}

// ============================================================================
// EVALUATOR
// ============================================================================

fn trained_policy(dir: &std::path::Path) -> CascadePolicy {
    let train = synthetic_dataset(&[0, 2, 10], 3, 4);
    let mut policy = CascadePolicy::new(ModelStore::new(dir));
    policy.train(&finalize(&train).unwrap(), true).unwrap();
    policy
}

#[test]
fn test_cached_report_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("metrics");
    let policy = trained_policy(&dir.path().join("models"));
    let test = synthetic_dataset(&[0, 2, 10], 1, 6);

    let fresh = evaluate(&test, &policy, &reports, false).unwrap();
    let identity = test_set_identity(&test).unwrap();
    assert!(report_path(&reports, &identity).exists());

    // No artifacts behind this policy: only a cache hit can succeed
    let untrained = CascadePolicy::new(ModelStore::new(dir.path().join("empty")));
    let cached = evaluate(&test, &untrained, &reports, false).unwrap();

    for (code, m) in fresh.fault_classes() {
        assert_eq!(cached.class(code).unwrap().f1_score, m.f1_score);
    }
    assert_eq!(cached, fresh);

    assert!(matches!(
        evaluate(&test, &untrained, &reports, true),
        Err(PipelineError::ArtifactMissing(_))
    ));
}

#[test]
fn test_identity_tracks_content() {
    let a = synthetic_dataset(&[1], 1, 3);
    let mut b = a.clone();
    b[2].sample_index = 9;

    let id_a = test_set_identity(&a).unwrap();
    assert_eq!(id_a.len(), 64);
    assert_eq!(id_a, test_set_identity(&a.clone()).unwrap());
    assert_ne!(id_a, test_set_identity(&b).unwrap());

    let path = report_path(std::path::Path::new("m"), &id_a);
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("metrics-{}.json", &id_a[..16])
    );
}

#[test]
fn test_evaluate_empty_test_set() {
    let dir = tempfile::tempdir().unwrap();
    let policy = CascadePolicy::new(ModelStore::new(dir.path()));
    assert!(matches!(
        evaluate(&[], &policy, dir.path(), false),
        Err(PipelineError::Configuration(_))
    ));
}

// ============================================================================
// RENDERING
// ============================================================================

#[test]
fn test_render_orders_faults_numerically() {
    let report = classification_report(&[0, 2, 10, 10], &[0, 2, 10, 2]);
    let text = render(&report);

    assert!(text.lines().all(|line| line.chars().count() <= 60));
    let pos2 = text.find("Fault 2 ").unwrap();
    let pos10 = text.find("Fault 10").unwrap();
    assert!(pos2 < pos10);
    assert!(text.contains("GLOBAL ACCURACY: 75.00%"));
    assert!(!text.contains("macro avg"));
}

#[test]
fn test_fault_profile() {
    let report = sample_report();

    let known = fault_profile(&report, 1);
    assert_eq!(known.description, "Fault 1");
    assert!(close(known.f1_score, 0.8));
    assert!(close(known.accuracy, 0.6));
    assert_eq!(known.comment, "Recall: 100.0%");

    let missing = fault_profile(&report, 17);
    assert_eq!(missing.description, "N/A");
    assert_eq!(missing.f1_score, 0.0);
}
