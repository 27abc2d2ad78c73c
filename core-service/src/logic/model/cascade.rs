//! Cascade Policy - detector first, diagnostician only on anomalies
//!
//! Stage 1 is a binary detector trained on every row with labels
//! collapsed to {0, 1}. Stage 2 is a multiclass diagnostician trained
//! only on faulty rows. The diagnostician is never consulted when the
//! detector reports normal operation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classifier::{CentroidClassifier, Classifier};
use crate::logic::dataset::{FaultCode, LabeledSet};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureVector, LayoutInfo};
use crate::logic::storage;

pub const DETECTOR_FILE: &str = "tep_detector.json";
pub const DIAGNOSTICIAN_FILE: &str = "tep_diagnostician.json";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Cascade output for one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub is_anomaly: bool,
    pub fault_code: FaultCode,
}

impl Prediction {
    pub const NORMAL: Prediction = Prediction {
        is_anomaly: false,
        fault_code: 0,
    };
}

/// Serialized classifier plus the layout contract it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact<C> {
    pub role: String,
    pub layout: LayoutInfo,
    /// Shared by both halves of one cascade
    pub training_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub model: C,
}

/// Header fields read without decoding the classifier
#[derive(Deserialize)]
struct ArtifactStamp {
    training_id: Uuid,
}

/// Outcome of an idempotent training request
#[derive(Debug)]
pub enum TrainOutcome {
    /// A complete pair was already published; nothing was fitted or written
    Skipped,
    Trained {
        detector_rows: usize,
        diagnostician_rows: usize,
    },
}

/// Health/readiness view for a serving layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub detector_ready: bool,
    pub diagnostician_ready: bool,
}

// ============================================================================
// CASCADE MODEL
// ============================================================================

/// Fitted detector/diagnostician pair, read-only during inference
#[derive(Debug, Clone)]
pub struct CascadeModel<D = CentroidClassifier, G = CentroidClassifier> {
    detector: D,
    diagnostician: G,
    layout: LayoutInfo,
}

impl<D: Classifier, G: Classifier> CascadeModel<D, G> {
    pub fn new(detector: D, diagnostician: G) -> Self {
        Self {
            detector,
            diagnostician,
            layout: LayoutInfo::current(),
        }
    }

    /// Two-stage prediction on one vector
    pub fn predict(&self, vector: &FeatureVector) -> PipelineResult<Prediction> {
        self.check_schema(vector)?;
        let row = vector.as_slice();

        if self.detector.predict_row(row) == 0 {
            return Ok(Prediction::NORMAL);
        }

        Ok(Prediction {
            is_anomaly: true,
            fault_code: self.diagnostician.predict_row(row),
        })
    }

    /// Reject vectors built against another channel layout before inference
    fn check_schema(&self, vector: &FeatureVector) -> PipelineResult<()> {
        vector.validate()?;
        if vector.version != self.layout.version || vector.layout_hash != self.layout.hash {
            return Err(PipelineError::Schema(format!(
                "vector layout v{} ({:08x}) does not match trained layout v{} ({:08x})",
                vector.version, vector.layout_hash, self.layout.version, self.layout.hash
            )));
        }
        Ok(())
    }
}

impl CascadeModel {
    /// Fit both stages on a training set
    pub fn fit(train: &LabeledSet) -> PipelineResult<Self> {
        let binary: Vec<FaultCode> = train.labels.iter().map(|&l| u8::from(l > 0)).collect();
        log::info!("Training fault detector on {} rows", binary.len());
        let detector = CentroidClassifier::fit(train.features.view(), &binary, "detector")?;

        // Normal rows would teach the diagnostician a meaningless class 0
        let faulty = train.filter_labels(|l| l > 0);
        log::info!("Training fault diagnostician on {} faulty rows", faulty.len());
        let diagnostician =
            CentroidClassifier::fit(faulty.features.view(), &faulty.labels, "diagnostician")?;

        Ok(Self::new(detector, diagnostician))
    }
}

// ============================================================================
// ARTIFACT STORE
// ============================================================================

/// Location of the two serialized cascade artifacts
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn detector_path(&self) -> PathBuf {
        self.dir.join(DETECTOR_FILE)
    }

    pub fn diagnostician_path(&self) -> PathBuf {
        self.dir.join(DIAGNOSTICIAN_FILE)
    }

    pub fn artifacts_exist(&self) -> bool {
        self.detector_path().exists() && self.diagnostician_path().exists()
    }

    /// Both artifacts present and stamped by the same training run.
    /// Each file is published atomically, but the pair is not: an
    /// interrupted retrain can leave halves from different runs.
    pub fn is_complete(&self) -> bool {
        match (self.stamp(&self.detector_path()), self.stamp(&self.diagnostician_path())) {
            (Some(detector), Some(diagnostician)) => detector == diagnostician,
            _ => false,
        }
    }

    fn stamp(&self, path: &Path) -> Option<Uuid> {
        storage::load_json::<ArtifactStamp>(path)
            .ok()
            .map(|stamp| stamp.training_id)
    }

    pub fn save(&self, model: &CascadeModel, detector_rows: usize, diagnostician_rows: usize) -> PipelineResult<()> {
        let training_id = Uuid::new_v4();
        let trained_at = Utc::now();
        storage::publish_json(
            &self.detector_path(),
            &ModelArtifact {
                role: "detector".to_string(),
                layout: model.layout.clone(),
                training_id,
                trained_at,
                training_rows: detector_rows,
                model: &model.detector,
            },
        )?;
        storage::publish_json(
            &self.diagnostician_path(),
            &ModelArtifact {
                role: "diagnostician".to_string(),
                layout: model.layout.clone(),
                training_id,
                trained_at,
                training_rows: diagnostician_rows,
                model: &model.diagnostician,
            },
        )?;
        log::info!("Cascade artifacts ({}) saved to {:?}", training_id, self.dir);
        Ok(())
    }

    pub fn load(&self) -> PipelineResult<CascadeModel> {
        let detector = self.load_artifact(&self.detector_path())?;
        let diagnostician = self.load_artifact(&self.diagnostician_path())?;
        if detector.training_id != diagnostician.training_id {
            return Err(PipelineError::MismatchedArtifacts {
                detector: detector.training_id,
                diagnostician: diagnostician.training_id,
            });
        }
        log::info!(
            "Loaded cascade (detector trained {}, diagnostician trained {})",
            detector.trained_at,
            diagnostician.trained_at
        );
        Ok(CascadeModel::new(detector.model, diagnostician.model))
    }

    fn load_artifact(&self, path: &Path) -> PipelineResult<ModelArtifact<CentroidClassifier>> {
        let artifact: ModelArtifact<CentroidClassifier> = match storage::load_json(path) {
            Err(PipelineError::NotFound(p)) => return Err(PipelineError::ArtifactMissing(p)),
            other => other?,
        };
        artifact.layout.validate()?;
        Ok(artifact)
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Owns the artifact store and the lazily loaded cascade
pub struct CascadePolicy {
    store: ModelStore,
    model: OnceCell<CascadeModel>,
}

impl CascadePolicy {
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            model: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Train both stages unless a complete pair already exists and `force` is false
    pub fn train(&mut self, train: &LabeledSet, force: bool) -> PipelineResult<TrainOutcome> {
        if !force {
            if self.store.is_complete() {
                log::info!("Model artifacts found in {:?}, skipping training", self.store.dir());
                return Ok(TrainOutcome::Skipped);
            }
            if self.store.artifacts_exist() {
                log::warn!("Model artifacts in {:?} do not form one pair, retraining", self.store.dir());
            }
        }

        let model = CascadeModel::fit(train)?;
        let detector_rows = train.len();
        let diagnostician_rows = train.labels.iter().filter(|&&l| l > 0).count();
        self.store.save(&model, detector_rows, diagnostician_rows)?;

        self.model = OnceCell::new();
        let _ = self.model.set(model);

        Ok(TrainOutcome::Trained {
            detector_rows,
            diagnostician_rows,
        })
    }

    /// Cascade prediction; loads artifacts on first use
    pub fn predict(&self, vector: &FeatureVector) -> PipelineResult<Prediction> {
        self.model()?.predict(vector)
    }

    pub fn model(&self) -> PipelineResult<&CascadeModel> {
        self.model.get_or_try_init(|| self.store.load())
    }

    pub fn health(&self) -> HealthStatus {
        let loaded = self.model.get().is_some();
        HealthStatus {
            status: "healthy".to_string(),
            detector_ready: loaded || self.store.detector_path().exists(),
            diagnostician_ready: loaded || self.store.diagnostician_path().exists(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::logic::dataset::{finalize, synthetic_dataset, synthetic_record};

    /// Fixed answer, counts how often it is consulted
    struct Stub {
        answer: FaultCode,
        calls: Cell<usize>,
    }

    impl Stub {
        fn new(answer: FaultCode) -> Self {
            Self {
                answer,
                calls: Cell::new(0),
            }
        }
    }

    impl Classifier for Stub {
        fn predict_row(&self, _row: &[f32]) -> FaultCode {
            self.calls.set(self.calls.get() + 1);
            self.answer
        }
    }

    #[test]
    fn test_normal_never_consults_diagnostician() {
        let cascade = CascadeModel::new(Stub::new(0), Stub::new(13));

        let prediction = cascade.predict(&FeatureVector::default()).unwrap();

        assert_eq!(prediction, Prediction::NORMAL);
        assert_eq!(cascade.diagnostician.calls.get(), 0);
    }

    #[test]
    fn test_anomaly_uses_diagnosis() {
        let cascade = CascadeModel::new(Stub::new(1), Stub::new(13));

        let prediction = cascade.predict(&FeatureVector::default()).unwrap();

        assert_eq!(
            prediction,
            Prediction {
                is_anomaly: true,
                fault_code: 13
            }
        );
        assert_eq!(cascade.diagnostician.calls.get(), 1);
    }

    #[test]
    fn test_schema_mismatch_rejected_before_inference() {
        let cascade = CascadeModel::new(Stub::new(1), Stub::new(2));
        let mut vector = FeatureVector::default();
        vector.layout_hash = vector.layout_hash.wrapping_add(1);

        assert!(matches!(cascade.predict(&vector), Err(PipelineError::Schema(_))));
        assert_eq!(cascade.detector.calls.get(), 0);
    }

    #[test]
    fn test_fit_learns_separable_classes() {
        let set = finalize(&synthetic_dataset(&[0, 3, 7], 3, 5)).unwrap();
        let model = CascadeModel::fit(&set).unwrap();

        assert_eq!(model.diagnostician.classes(), &[3, 7]);
        assert_eq!(model.predict(&synthetic_record(0, 9, 2).features).unwrap(), Prediction::NORMAL);
        assert_eq!(
            model.predict(&synthetic_record(7, 9, 2).features).unwrap(),
            Prediction {
                is_anomaly: true,
                fault_code: 7
            }
        );
    }

    #[test]
    fn test_fit_without_faulty_rows_fails() {
        let set = finalize(&synthetic_dataset(&[0], 2, 5)).unwrap();
        assert!(matches!(
            CascadeModel::fit(&set),
            Err(PipelineError::EmptyTrainingSet("diagnostician"))
        ));
    }

    #[test]
    fn test_predict_before_training_is_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let policy = CascadePolicy::new(ModelStore::new(dir.path()));

        let health = policy.health();
        assert!(!health.detector_ready && !health.diagnostician_ready);
        assert!(matches!(
            policy.predict(&FeatureVector::default()),
            Err(PipelineError::ArtifactMissing(_))
        ));
    }

    #[test]
    fn test_train_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let set = finalize(&synthetic_dataset(&[0, 2], 2, 4)).unwrap();

        let mut policy = CascadePolicy::new(ModelStore::new(dir.path()));
        assert!(matches!(
            policy.train(&set, false).unwrap(),
            TrainOutcome::Trained {
                detector_rows: 16,
                diagnostician_rows: 8
            }
        ));

        let detector_path = policy.store().detector_path();
        let stamp = std::fs::metadata(&detector_path).unwrap().modified().unwrap();

        // An empty set would fail to fit, so a skip proves nothing was computed
        let empty = finalize(&[]).unwrap();
        let mut second = CascadePolicy::new(ModelStore::new(dir.path()));
        assert!(matches!(second.train(&empty, false).unwrap(), TrainOutcome::Skipped));
        assert_eq!(std::fs::metadata(&detector_path).unwrap().modified().unwrap(), stamp);

        assert!(second.train(&empty, true).is_err());
    }

    #[test]
    fn test_artifacts_reload_with_same_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let set = finalize(&synthetic_dataset(&[0, 4, 9], 2, 5)).unwrap();

        let mut trained = CascadePolicy::new(ModelStore::new(dir.path()));
        trained.train(&set, true).unwrap();

        let reloaded = CascadePolicy::new(ModelStore::new(dir.path()));
        for class in [0, 4, 9] {
            let vector = synthetic_record(class, 5, 3).features;
            assert_eq!(trained.predict(&vector).unwrap(), reloaded.predict(&vector).unwrap());
        }
        assert!(reloaded.health().detector_ready);
    }

    #[test]
    fn test_corrupt_layout_in_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let set = finalize(&synthetic_dataset(&[0, 1], 2, 3)).unwrap();
        let store = ModelStore::new(dir.path());
        let mut policy = CascadePolicy::new(store.clone());
        policy.train(&set, true).unwrap();

        let mut artifact: ModelArtifact<CentroidClassifier> =
            storage::load_json(&store.detector_path()).unwrap();
        artifact.layout.feature_names.reverse();
        storage::publish_json(&store.detector_path(), &artifact).unwrap();

        assert!(matches!(store.load(), Err(PipelineError::Schema(_))));
    }

    #[test]
    fn test_mixed_pair_is_retrained_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let set = finalize(&synthetic_dataset(&[0, 1, 2], 2, 4)).unwrap();

        CascadePolicy::new(store.clone()).train(&set, true).unwrap();
        assert!(store.is_complete());

        // Detector from another run, as left by a retrain interrupted between renames
        let foreign = finalize(&synthetic_dataset(&[0, 5, 6], 2, 4)).unwrap();
        let foreign_store = ModelStore::new(other.path());
        CascadePolicy::new(foreign_store.clone()).train(&foreign, true).unwrap();
        std::fs::copy(foreign_store.detector_path(), store.detector_path()).unwrap();

        assert!(store.artifacts_exist());
        assert!(!store.is_complete());
        assert!(matches!(store.load(), Err(PipelineError::MismatchedArtifacts { .. })));
        assert!(matches!(
            CascadePolicy::new(store.clone()).predict(&FeatureVector::default()),
            Err(PipelineError::MismatchedArtifacts { .. })
        ));

        let mut policy = CascadePolicy::new(store.clone());
        assert!(matches!(policy.train(&set, false).unwrap(), TrainOutcome::Trained { .. }));
        assert!(store.is_complete());
        assert_eq!(store.load().unwrap().diagnostician.classes(), &[1, 2]);
    }
}
