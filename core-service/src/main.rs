//! TEP Reactor Monitor - batch entry point
//!
//! Builds the run-wise subset, trains the cascade when needed and prints
//! the evaluation dashboard.

use anyhow::Context;

use tep_monitor_core::constants::{APP_NAME, APP_VERSION};
use tep_monitor_core::logic::config::PipelineConfig;
use tep_monitor_core::logic::evaluation;
use tep_monitor_core::logic::model::TrainOutcome;
use tep_monitor_core::logic::pipeline;

fn run() -> anyhow::Result<()> {
    let config = PipelineConfig::from_env();
    log::info!("Data: {:?} | Models: {:?}", config.data_dir, config.model_dir);
    log::info!(
        "Runs/class: {} | Test size: {} | Seed: {} | Force: {}",
        config.n_simulations,
        config.test_size,
        config.random_seed,
        config.force_reprocess
    );

    let outcome = pipeline::run_batch(&config).context("batch pipeline failed")?;

    match outcome.training {
        TrainOutcome::Skipped => log::info!("Training skipped, existing artifacts reused"),
        TrainOutcome::Trained {
            detector_rows,
            diagnostician_rows,
        } => log::info!(
            "Trained detector on {} rows, diagnostician on {} rows",
            detector_rows,
            diagnostician_rows
        ),
    }
    log::info!(
        "Split: {} train runs / {} test runs",
        outcome.train_runs,
        outcome.test_runs
    );

    print!("{}", evaluation::render(&outcome.report));
    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
