use crate::cli::RunArgs;
use crate::config::{self, AppConfig};
use crate::engine::ProcessEngine;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdrescue::core::models::state::ResumeState;
use mdrescue::engine::progress::ProgressReporter;
use mdrescue::workflows::pipeline;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[instrument(skip_all, name = "run_command")]
pub fn run(args: RunArgs) -> Result<()> {
    let app = load_with_overrides(&args.config, args.max_retries, args.output_dir)?;
    info!(
        stages = app.stages.len(),
        max_retries = app.recovery.max_retries,
        "Loaded job configuration."
    );

    let handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    match execute(app, &reporter)? {
        Some(state) => println!("✓ Pipeline complete. Final state: {}", state),
        None => println!("Job configuration contained no stages; nothing to do."),
    }
    Ok(())
}

/// Runs a validated job. Shared with the batch dispatcher, which supplies
/// its own reporter.
pub(crate) fn execute(
    app: AppConfig,
    reporter: &ProgressReporter,
) -> Result<Option<ResumeState>> {
    let engine = ProcessEngine::from_config(&app.engine);
    let state = pipeline::run(&engine, app.stages, &app.recovery, reporter)?;
    Ok(state)
}

pub(crate) fn load_with_overrides(
    config_path: &Path,
    max_retries: Option<u32>,
    output_dir: Option<PathBuf>,
) -> Result<AppConfig> {
    let mut app = config::load_job(config_path)?;
    if let Some(retries) = max_retries {
        info!(max_retries = retries, "Overriding retry bound from CLI.");
        app.recovery.max_retries = retries;
    }
    if let Some(dir) = output_dir {
        info!(output_dir = %dir.display(), "Overriding output directory from CLI.");
        for stage in &mut app.stages {
            stage.output_dir = dir.clone();
        }
    }
    Ok(app)
}
