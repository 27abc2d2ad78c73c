//! Pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::constants;
use crate::logic::error::{PipelineError, PipelineResult};

/// Batch pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root data directory
    pub data_dir: PathBuf,

    /// Model artifacts and cached metrics
    pub model_dir: PathBuf,

    /// Runs retained per fault class
    pub n_simulations: usize,

    /// Fraction of runs held out for evaluation
    pub test_size: f64,

    /// Seed for the run-wise shuffle
    pub random_seed: u64,

    /// Recompute cached artifacts
    pub force_reprocess: bool,

    /// Remote prediction endpoint
    pub inference_url: String,

    pub inference_timeout: Duration,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            data_dir: constants::get_data_dir(),
            model_dir: constants::get_model_dir(),
            n_simulations: constants::get_n_simulations(),
            test_size: constants::get_test_size(),
            random_seed: constants::get_random_seed(),
            force_reprocess: constants::is_force_reprocess(),
            inference_url: constants::get_inference_url(),
            inference_timeout: Duration::from_millis(constants::get_inference_timeout_ms()),
        }
    }

    /// Config rooted at `data_dir` with every other value at its default
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            model_dir: data_dir.join("models"),
            data_dir,
            n_simulations: constants::DEFAULT_N_SIMULATIONS,
            test_size: constants::DEFAULT_TEST_SIZE,
            random_seed: constants::DEFAULT_RANDOM_SEED,
            force_reprocess: false,
            inference_url: constants::DEFAULT_INFERENCE_URL.to_string(),
            inference_timeout: Duration::from_millis(constants::DEFAULT_INFERENCE_TIMEOUT_MS),
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.n_simulations == 0 {
            return Err(PipelineError::Configuration(
                "N_SIMULATIONS must be at least 1".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "TEST_SIZE must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    /// Full merged dataset (JSONL)
    pub fn merged_path(&self) -> PathBuf {
        self.processed_dir().join("TEP_merged.jsonl")
    }

    pub fn subsets_dir(&self) -> PathBuf {
        self.processed_dir().join("subsets")
    }

    /// Archive of the held-out test set
    pub fn final_split_dir(&self) -> PathBuf {
        self.processed_dir().join("final")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.model_dir.join("metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_data_dir() {
        let config = PipelineConfig::with_data_dir("/srv/tep");
        assert_eq!(config.merged_path(), PathBuf::from("/srv/tep/processed/TEP_merged.jsonl"));
        assert_eq!(config.reports_dir(), PathBuf::from("/srv/tep/models/metrics"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::with_data_dir("/tmp");
        config.test_size = 1.0;
        assert!(config.validate().is_err());

        config.test_size = 0.2;
        config.n_simulations = 0;
        assert!(config.validate().is_err());
    }
}
