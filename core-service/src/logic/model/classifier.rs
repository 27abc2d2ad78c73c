//! Classifier contract and the standardised nearest-centroid model.
//!
//! The cascade only relies on `Classifier::predict_row`; any fitted model
//! honouring the channel layout can stand in for either stage.

use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::dataset::FaultCode;
use crate::logic::error::{PipelineError, PipelineResult};

/// Minimum standard deviation before a channel is treated as constant
const MIN_SCALE: f32 = 1e-8;

/// Trait for fitted per-row classifiers
pub trait Classifier {
    /// Predict the class of one channel-ordered row
    fn predict_row(&self, row: &[f32]) -> FaultCode;
}

/// Standard scaling followed by nearest class centroid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidClassifier {
    mean: Array1<f32>,
    scale: Array1<f32>,
    classes: Vec<FaultCode>,
    centroids: Array2<f32>,
}

impl CentroidClassifier {
    /// Fit on a feature table and its labels. `role` names the stage in errors.
    pub fn fit(features: ArrayView2<f32>, labels: &[FaultCode], role: &'static str) -> PipelineResult<Self> {
        if labels.is_empty() || features.nrows() != labels.len() {
            return Err(PipelineError::EmptyTrainingSet(role));
        }

        let mean = features
            .mean_axis(Axis(0))
            .ok_or(PipelineError::EmptyTrainingSet(role))?;
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > MIN_SCALE { s } else { 1.0 });
        let scaled = (&features - &mean) / &scale;

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let mut centroids = Array2::zeros((classes.len(), features.ncols()));
        for (k, class) in classes.iter().enumerate() {
            let rows: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| *l == class)
                .map(|(i, _)| i)
                .collect();
            if let Some(centroid) = scaled.select(Axis(0), &rows).mean_axis(Axis(0)) {
                centroids.row_mut(k).assign(&centroid);
            }
        }

        log::debug!(
            "Fitted {} on {} rows, classes {:?}",
            role,
            labels.len(),
            classes
        );

        Ok(Self {
            mean,
            scale,
            classes,
            centroids,
        })
    }

    pub fn classes(&self) -> &[FaultCode] {
        &self.classes
    }
}

impl Classifier for CentroidClassifier {
    fn predict_row(&self, row: &[f32]) -> FaultCode {
        let x = (&ArrayView1::from(row) - &self.mean) / &self.scale;

        self.centroids
            .outer_iter()
            .zip(self.classes.iter())
            .map(|(centroid, &class)| {
                let dist: f32 = (&centroid - &x).mapv(|v| v * v).sum();
                (dist, class)
            })
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
            .map(|(_, class)| class)
            .unwrap_or(0)
    }
}
