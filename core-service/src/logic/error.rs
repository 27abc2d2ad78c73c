//! Error handling for batch operations (partitioning, training, evaluation).

use std::path::PathBuf;

use crate::logic::features::layout::LayoutMismatchError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid split fraction, quota or run count. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required source artifact (dataset, model, test set) is absent
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Channel set or order does not match the trained layout
    #[error("schema error: {0}")]
    Schema(String),

    /// Predict was called before any successful training
    #[error("model artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Detector and diagnostician were published by different training runs
    #[error("model artifacts come from different trainings (detector {detector}, diagnostician {diagnostician})")]
    MismatchedArtifacts {
        detector: uuid::Uuid,
        diagnostician: uuid::Uuid,
    },

    /// Train/test disjointness was violated
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("cannot fit {0} on an empty training set")]
    EmptyTrainingSet(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<LayoutMismatchError> for PipelineError {
    fn from(err: LayoutMismatchError) -> Self {
        PipelineError::Schema(err.to_string())
    }
}
