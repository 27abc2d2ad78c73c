//! Dataset Module - TEP source records and the run-aware Partitioner
//!
//! Records are stored in JSONL format. Every split decision is taken per
//! simulation run so no run contributes to both train and test.

pub mod audit;
pub mod partition;
pub mod record;
pub mod store;


pub use audit::{audit, DatasetAudit};
pub use partition::{
    distinct_runs, downsample, finalize, split_by_run, verify_disjoint, LabeledSet, Partition,
};
pub use record::{FaultCode, RunId, SourceRecord};

/// Record whose channels all sit near `10 * fault_class`, with a small
/// per-sample wobble. Classes are trivially separable.
#[cfg(test)]
pub(crate) fn synthetic_record(fault_class: FaultCode, run_index: u32, sample_index: u32) -> SourceRecord {
    use crate::logic::features::{FeatureVector, FEATURE_COUNT};

    let base = 100.0 + 10.0 * fault_class as f32;
    let wobble = ((sample_index % 5) as f32 - 2.0) * 0.1;
    let values = (0..FEATURE_COUNT).map(|i| base + wobble + i as f32 * 0.01).collect();

    SourceRecord {
        fault_class,
        run_index,
        sample_index,
        features: FeatureVector::from_values(values).expect("layout-sized vector"),
    }
}

/// `runs` runs of `samples` rows for each listed class
#[cfg(test)]
pub(crate) fn synthetic_dataset(classes: &[FaultCode], runs: u32, samples: u32) -> Vec<SourceRecord> {
    let mut records = Vec::new();
    for &class in classes {
        for run in 1..=runs {
            for sample in 1..=samples {
                records.push(synthetic_record(class, run, sample));
            }
        }
    }
    records
}
