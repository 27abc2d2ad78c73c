//! Partitioner - run-aware downsampling and train/test splitting
//!
//! A simulation run is the atomic unit: every decision (keep, drop,
//! train, test) is taken per `RunId`, never per row, so samples from one
//! run can never leak across the split.

use std::collections::{HashMap, HashSet};

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::record::{FaultCode, RunId, SourceRecord};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FEATURE_COUNT;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Result of a run-wise split
#[derive(Debug, Clone)]
pub struct Partition {
    pub train: Vec<SourceRecord>,
    pub test: Vec<SourceRecord>,
    pub train_runs: Vec<RunId>,
    pub test_runs: Vec<RunId>,
}

/// Channel-ordered feature table plus label column, metadata stripped
#[derive(Debug, Clone)]
pub struct LabeledSet {
    pub features: Array2<f32>,
    pub labels: Vec<FaultCode>,
}

impl LabeledSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Keep only rows whose label satisfies `keep`
    pub fn filter_labels(&self, keep: impl Fn(FaultCode) -> bool) -> LabeledSet {
        let indices: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| keep(label))
            .map(|(i, _)| i)
            .collect();

        LabeledSet {
            features: self.features.select(Axis(0), &indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Distinct run ids in first-encountered order
pub fn distinct_runs(records: &[SourceRecord]) -> Vec<RunId> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(SourceRecord::run_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Keep at most `quota` runs per fault class.
///
/// Selection is the first `quota` runs of each class in input order, so
/// the result depends only on the input ordering. Classes with fewer runs
/// than the quota are left untouched.
pub fn downsample(records: Vec<SourceRecord>, quota: usize) -> PipelineResult<Vec<SourceRecord>> {
    if quota == 0 {
        return Err(PipelineError::Configuration(
            "per-class run quota must be at least 1".to_string(),
        ));
    }

    let mut kept_per_class: HashMap<FaultCode, usize> = HashMap::new();
    let mut selected: HashSet<RunId> = HashSet::new();
    for run in distinct_runs(&records) {
        let kept = kept_per_class.entry(run.fault_class).or_insert(0);
        if *kept < quota {
            *kept += 1;
            selected.insert(run);
        }
    }

    let before = records.len();
    let retained: Vec<SourceRecord> = records
        .into_iter()
        .filter(|r| selected.contains(&r.run_id()))
        .collect();

    log::info!(
        "Downsampled to {} runs per class: {} runs, {} of {} rows kept",
        quota,
        selected.len(),
        retained.len(),
        before
    );
    Ok(retained)
}

/// Group-wise split: shuffle run ids with `seed`, first `(1 - test_fraction)`
/// share goes to train, the rest to test.
pub fn split_by_run(records: Vec<SourceRecord>, test_fraction: f64, seed: u64) -> PipelineResult<Partition> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::Configuration(format!(
            "test fraction must lie in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut runs = distinct_runs(&records);
    if runs.len() < 2 {
        return Err(PipelineError::Configuration(format!(
            "run-wise split needs at least 2 distinct runs, got {}",
            runs.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    runs.shuffle(&mut rng);

    // Neither side may end up empty
    let split_idx = ((runs.len() as f64) * (1.0 - test_fraction)).floor() as usize;
    let split_idx = split_idx.clamp(1, runs.len() - 1);

    let test_runs = runs.split_off(split_idx);
    let train_runs = runs;
    let train_set: HashSet<RunId> = train_runs.iter().copied().collect();

    let (train, test): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| train_set.contains(&r.run_id()));

    let partition = Partition {
        train,
        test,
        train_runs,
        test_runs,
    };
    verify_disjoint(&partition.train, &partition.test)?;

    log::info!(
        "Run-wise split (seed {}): train {} rows / {} runs | test {} rows / {} runs",
        seed,
        partition.train.len(),
        partition.train_runs.len(),
        partition.test.len(),
        partition.test_runs.len()
    );
    Ok(partition)
}

/// Fail if any run contributes rows to both partitions
pub fn verify_disjoint(train: &[SourceRecord], test: &[SourceRecord]) -> PipelineResult<()> {
    let train_runs: HashSet<RunId> = train.iter().map(SourceRecord::run_id).collect();
    let mut leaked: Vec<RunId> = test
        .iter()
        .map(SourceRecord::run_id)
        .filter(|id| train_runs.contains(id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if leaked.is_empty() {
        return Ok(());
    }

    leaked.sort();
    let names: Vec<String> = leaked.iter().map(RunId::to_string).collect();
    Err(PipelineError::InternalInvariant(format!(
        "runs present in both train and test: {}",
        names.join(", ")
    )))
}

/// Strip identity columns and return the channel-ordered table and labels
pub fn finalize(records: &[SourceRecord]) -> PipelineResult<LabeledSet> {
    let mut flat = Vec::with_capacity(records.len() * FEATURE_COUNT);
    let mut labels = Vec::with_capacity(records.len());

    for record in records {
        record.features.validate()?;
        flat.extend_from_slice(record.features.as_slice());
        labels.push(record.fault_class);
    }

    let features = Array2::from_shape_vec((records.len(), FEATURE_COUNT), flat)
        .map_err(|e| PipelineError::Schema(format!("feature table shape: {}", e)))?;

    Ok(LabeledSet { features, labels })
}
