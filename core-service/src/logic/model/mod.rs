//! Model Module - Cascade Policy and inference adapters
//!
//! Training and artifact caching live in `cascade`; the classifier
//! contract in `classifier`; local/remote prediction sources for the
//! streaming monitor in `inference`.

pub mod cascade;
pub mod classifier;
pub mod inference;

// Re-export common types
pub use cascade::{
    CascadeModel, CascadePolicy, HealthStatus, ModelArtifact, ModelStore, Prediction,
    TrainOutcome,
};
pub use classifier::{CentroidClassifier, Classifier};
pub use inference::{InferenceError, InferenceResponse, Predictor, RemotePredictor, SensorPayload};
