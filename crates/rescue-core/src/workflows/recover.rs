use crate::core::models::spec::SimulationStepSpec;
use crate::core::models::state::ResumeState;
use crate::engine::config::RecoveryConfig;
use crate::engine::error::RecoveryError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::recovery::RetrySupervisor;
use crate::engine::sim::SimulationEngine;
use tracing::{info, instrument};

/// Runs one simulation step under crash-recovery supervision.
///
/// Returns the final resume state on success, with any partial outputs from
/// recovered crashes already merged into the canonical trajectory/report
/// pair. Fails only when the step aborted on an unrecoverable error or the
/// retry bound ran out; the error carries the last crash's diagnostic.
#[instrument(skip_all, name = "recovery_workflow", fields(step = %spec.name))]
pub fn run<E: SimulationEngine>(
    engine: &E,
    spec: SimulationStepSpec,
    config: &RecoveryConfig,
    reporter: &ProgressReporter,
) -> Result<ResumeState, RecoveryError> {
    reporter.report(Progress::PhaseStart {
        name: "Supervised Simulation",
    });
    info!(
        steps = spec.total_steps,
        max_retries = config.max_retries,
        "Starting supervised simulation step."
    );

    let supervisor = RetrySupervisor::new(engine, config, reporter);
    let outcome = supervisor.run(spec)?;

    if outcome.retries() > 0 {
        info!(retries = outcome.retries(), "Step recovered successfully.");
    }
    reporter.report(Progress::PhaseFinish);
    Ok(outcome.final_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::RecoveryConfigBuilder;
    use crate::engine::testing::{ScriptedEngine, ScriptedRun};
    use tempfile::tempdir;

    #[test]
    fn returns_the_final_state_reference() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(vec![ScriptedRun::succeed()]);
        let config = RecoveryConfigBuilder::new().max_retries(1).build();
        let reporter = ProgressReporter::new();

        let state = run(
            &engine,
            ScriptedEngine::spec("equilibration", dir.path(), 1_000),
            &config,
            &reporter,
        )
        .unwrap();

        assert!(state.path().starts_with(dir.path().join("equilibration")));
    }

    #[test]
    fn surfaces_terminal_errors_unchanged() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new(vec![ScriptedRun::fail("no CUDA device")]);
        let config = RecoveryConfigBuilder::new().build();
        let reporter = ProgressReporter::new();

        let err = run(
            &engine,
            ScriptedEngine::spec("equilibration", dir.path(), 1_000),
            &config,
            &reporter,
        )
        .unwrap_err();

        assert!(matches!(err, RecoveryError::FatalAborted { .. }));
    }
}
