//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden through the environment.

use std::path::PathBuf;

/// Minutes between two consecutive TEP samples
pub const SAMPLE_INTERVAL: f64 = 3.0;

/// Fault injection time used by the TEP simulations (minutes)
pub const DEFAULT_INJECTION_TIME: f64 = 60.0;

/// Window during which diagnosis output is hidden from operators
pub const DEFAULT_STABILIZATION_TIME: f64 = 60.0;

/// Default number of simulation runs retained per fault class
pub const DEFAULT_N_SIMULATIONS: usize = 10;

/// Default fraction of runs held out for evaluation
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Default seed threaded through every randomized step
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default inference endpoint
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:8000";

/// Default inference timeout (milliseconds), must stay under one second
pub const DEFAULT_INFERENCE_TIMEOUT_MS: u64 = 800;

/// Highest fault code produced by the simulator
pub const MAX_FAULT_CODE: u8 = 20;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "TEP Reactor Monitor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Root data directory (`DATA_PATH`)
pub fn get_data_dir() -> PathBuf {
    std::env::var("DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tep-monitor")
                .join("data")
        })
}

/// Model artifact directory (`MODEL_PATH`), defaults under the data dir
pub fn get_model_dir() -> PathBuf {
    std::env::var("MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join("models"))
}

/// Whether cached artifacts must be recomputed (`FORCE_REPROCESS`)
pub fn is_force_reprocess() -> bool {
    std::env::var("FORCE_REPROCESS")
        .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
        .unwrap_or(false)
}

/// Runs kept per fault class (`N_SIMULATIONS`)
pub fn get_n_simulations() -> usize {
    std::env::var("N_SIMULATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_N_SIMULATIONS)
}

/// Test fraction (`TEST_SIZE`)
pub fn get_test_size() -> f64 {
    std::env::var("TEST_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TEST_SIZE)
}

/// Split seed (`RANDOM_SEED`)
pub fn get_random_seed() -> u64 {
    std::env::var("RANDOM_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RANDOM_SEED)
}

/// Inference endpoint (`INFERENCE_URL`)
pub fn get_inference_url() -> String {
    std::env::var("INFERENCE_URL")
        .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string())
}

/// Inference timeout (`INFERENCE_TIMEOUT_MS`), capped at one second
pub fn get_inference_timeout_ms() -> u64 {
    std::env::var("INFERENCE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_INFERENCE_TIMEOUT_MS)
        .min(1000)
}
