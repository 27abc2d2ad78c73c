use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::partition::distinct_runs;
use super::record::{FaultCode, SourceRecord};

/// Structural integrity summary of a record set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetAudit {
    pub rows: usize,
    pub runs: usize,
    pub class_distribution: BTreeMap<FaultCode, usize>,
    pub non_finite_values: usize,
    pub layout_mismatches: usize,
}

impl DatasetAudit {
    /// Ready for training: non-empty, every value finite, every row on the current layout
    pub fn is_clean(&self) -> bool {
        self.rows > 0 && self.non_finite_values == 0 && self.layout_mismatches == 0
    }
}

pub fn audit(records: &[SourceRecord]) -> DatasetAudit {
    let mut class_distribution = BTreeMap::new();
    let mut non_finite_values = 0;
    let mut layout_mismatches = 0;

    for record in records {
        *class_distribution.entry(record.fault_class).or_insert(0) += 1;
        non_finite_values += record
            .features
            .as_slice()
            .iter()
            .filter(|v| !v.is_finite())
            .count();
        if record.features.validate().is_err() {
            layout_mismatches += 1;
        }
    }

    let report = DatasetAudit {
        rows: records.len(),
        runs: distinct_runs(records).len(),
        class_distribution,
        non_finite_values,
        layout_mismatches,
    };

    if report.is_clean() {
        log::info!("Dataset audit: {} rows, {} runs, clean", report.rows, report.runs);
    } else {
        log::warn!(
            "Dataset audit: {} rows, {} non-finite values, {} layout mismatches",
            report.rows,
            report.non_finite_values,
            report.layout_mismatches
        );
    }
    report
}
