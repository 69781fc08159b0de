use crate::cli::BatchArgs;
use crate::commands::run;
use crate::error::{CliError, Result};
use mdrescue::engine::progress::ProgressReporter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

#[instrument(skip_all, name = "batch_command")]
pub fn run(args: BatchArgs) -> Result<()> {
    let total = args.configs.len();
    info!(jobs = total, "Dispatching batch.");

    // Each job is independent; one system's terminal failure must not stop
    // its siblings.
    let failures: Vec<(PathBuf, CliError)> = args
        .configs
        .par_iter()
        .filter_map(|path| match run_one(path, args.max_retries) {
            Ok(()) => {
                info!(job = %path.display(), "Batch job completed.");
                None
            }
            Err(e) => {
                error!(job = %path.display(), error = %e, "Batch job failed.");
                Some((path.clone(), e))
            }
        })
        .collect();

    for (path, err) in &failures {
        eprintln!("✗ {}: {}", path.display(), err);
    }
    if failures.is_empty() {
        println!("✓ All {total} batch jobs completed.");
        Ok(())
    } else {
        Err(CliError::Batch {
            failed: failures.len(),
            total,
        })
    }
}

fn run_one(path: &Path, max_retries: Option<u32>) -> Result<()> {
    let app = run::load_with_overrides(path, max_retries, None)?;
    // Interactive progress is meaningless with interleaved workers; per-job
    // status still flows through the structured logs.
    let reporter = ProgressReporter::new();
    run::execute(app, &reporter)?;
    Ok(())
}
