//! Classification report: per-class precision/recall/F1 plus averages.
//!
//! Serialized shape is keyed by class id string with the extra keys
//! `accuracy`, `macro avg` and `weighted avg`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::logic::dataset::FaultCode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(flatten)]
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

impl EvaluationReport {
    pub fn class(&self, code: FaultCode) -> Option<&ClassMetrics> {
        self.classes.get(&code.to_string())
    }

    /// Numeric class entries in ascending class order
    pub fn fault_classes(&self) -> Vec<(FaultCode, &ClassMetrics)> {
        let mut entries: Vec<(FaultCode, &ClassMetrics)> = self
            .classes
            .iter()
            .filter_map(|(key, m)| key.parse::<FaultCode>().ok().map(|code| (code, m)))
            .collect();
        entries.sort_by_key(|(code, _)| *code);
        entries
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Build the report from aligned truth/prediction columns. Any undefined
/// ratio (no predictions or no support for a class) is reported as 0.
pub fn classification_report(y_true: &[FaultCode], y_pred: &[FaultCode]) -> EvaluationReport {
    let labels: BTreeSet<FaultCode> = y_true.iter().chain(y_pred.iter()).copied().collect();
    let pairs = || y_true.iter().zip(y_pred.iter());

    let mut classes = BTreeMap::new();
    for &label in &labels {
        let tp = pairs().filter(|(t, p)| **t == label && **p == label).count();
        let predicted = pairs().filter(|(_, p)| **p == label).count();
        let support = pairs().filter(|(t, _)| **t == label).count();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        classes.insert(
            label.to_string(),
            ClassMetrics {
                precision,
                recall,
                f1_score: f1(precision, recall),
                support,
            },
        );
    }

    let total = pairs().count();
    let correct = pairs().filter(|(t, p)| t == p).count();
    let n_labels = classes.len().max(1) as f64;

    let mut macro_avg = ClassMetrics {
        precision: 0.0,
        recall: 0.0,
        f1_score: 0.0,
        support: total,
    };
    let mut weighted_avg = macro_avg;
    for m in classes.values() {
        macro_avg.precision += m.precision / n_labels;
        macro_avg.recall += m.recall / n_labels;
        macro_avg.f1_score += m.f1_score / n_labels;

        let w = ratio(m.support, total);
        weighted_avg.precision += m.precision * w;
        weighted_avg.recall += m.recall * w;
        weighted_avg.f1_score += m.f1_score * w;
    }

    EvaluationReport {
        classes,
        accuracy: ratio(correct, total),
        macro_avg,
        weighted_avg,
    }
}
