use super::recover;
use crate::core::models::spec::SimulationStepSpec;
use crate::core::models::state::ResumeState;
use crate::engine::config::RecoveryConfig;
use crate::engine::error::RecoveryError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::sim::SimulationEngine;
use tracing::{info, instrument};

/// Runs an ordered list of configured stages for one input system.
///
/// The first stage starts from its configured state; every subsequent stage
/// consumes the final state of its predecessor. A terminal failure in any
/// stage abandons the remainder of the pipeline for this system.
///
/// Returns the last stage's final state, or `None` for an empty stage list.
#[instrument(skip_all, name = "pipeline_workflow")]
pub fn run<E: SimulationEngine>(
    engine: &E,
    stages: Vec<SimulationStepSpec>,
    config: &RecoveryConfig,
    reporter: &ProgressReporter,
) -> Result<Option<ResumeState>, RecoveryError> {
    let total = stages.len();
    let mut carried: Option<ResumeState> = None;

    for (position, mut spec) in stages.into_iter().enumerate() {
        if let Some(state) = carried.take() {
            spec.start_state = state;
        }
        reporter.report(Progress::StatusUpdate {
            text: format!("Stage {}/{}: {}", position + 1, total, spec.name),
        });
        info!(
            stage = %spec.name,
            position = position + 1,
            total,
            "Starting pipeline stage."
        );
        carried = Some(recover::run(engine, spec, config, reporter)?);
    }

    Ok(carried)
}
