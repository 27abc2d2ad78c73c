//! Batch pipeline: subset → split → archive → train → evaluate.

use crate::logic::config::PipelineConfig;
use crate::logic::dataset::{self, store, DatasetAudit};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::evaluation::{self, EvaluationReport};
use crate::logic::model::{CascadePolicy, ModelStore, TrainOutcome};

/// Everything the batch run produced
#[derive(Debug)]
pub struct BatchOutcome {
    pub audit: DatasetAudit,
    pub train_runs: usize,
    pub test_runs: usize,
    pub training: TrainOutcome,
    pub report: EvaluationReport,
}

pub fn run_batch(config: &PipelineConfig) -> PipelineResult<BatchOutcome> {
    config.validate()?;

    let records = store::load_subset(&config.merged_path(), &config.subsets_dir(), config.n_simulations)?;
    let audit = dataset::audit(&records);
    if !audit.is_clean() {
        return Err(PipelineError::Schema(format!(
            "dataset audit failed: {} rows, {} non-finite values, {} layout mismatches",
            audit.rows, audit.non_finite_values, audit.layout_mismatches
        )));
    }

    let partition = dataset::split_by_run(records, config.test_size, config.random_seed)?;
    store::save_test_set(&config.final_split_dir(), &partition.test)?;

    let train = dataset::finalize(&partition.train)?;
    let mut policy = CascadePolicy::new(ModelStore::new(&config.model_dir));
    let training = policy.train(&train, config.force_reprocess)?;

    let report = evaluation::evaluate(
        &partition.test,
        &policy,
        &config.reports_dir(),
        config.force_reprocess,
    )?;

    Ok(BatchOutcome {
        audit,
        train_runs: partition.train_runs.len(),
        test_runs: partition.test_runs.len(),
        training,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::synthetic_dataset;

    #[test]
    fn test_second_run_reuses_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::with_data_dir(dir.path());
        config.n_simulations = 4;
        store::write_records(&config.merged_path(), &synthetic_dataset(&[0, 1, 5], 6, 4)).unwrap();

        let first = run_batch(&config).unwrap();
        assert!(matches!(first.training, TrainOutcome::Trained { .. }));
        assert_eq!(first.train_runs + first.test_runs, 12);
        assert!(config.final_split_dir().join(store::TEST_SET_FILE).exists());

        // The merged source is not touched once the subset is cached
        std::fs::remove_file(config.merged_path()).unwrap();
        let second = run_batch(&config).unwrap();
        assert!(matches!(second.training, TrainOutcome::Skipped));
        assert_eq!(second.report, first.report);
    }

    #[test]
    fn test_missing_dataset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::with_data_dir(dir.path());
        assert!(matches!(run_batch(&config), Err(PipelineError::NotFound(_))));
    }
}
