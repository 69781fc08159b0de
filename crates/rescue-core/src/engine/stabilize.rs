use super::config::StabilizationParams;
use super::progress::{Progress, ProgressReporter};
use super::sim::SimulationEngine;
use crate::core::models::spec::{SimulationStepSpec, StepKind, StepParameters};
use crate::core::models::state::ResumeState;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Subdirectory of the crashed step's directory hosting the recovery
/// sub-step artifacts.
pub const FIRST_AID_DIR: &str = "firstAid";

/// Which of the two recovery sub-steps produced the returned state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizationOutcome {
    /// The low-temperature quench completed (from the relaxed geometry, or
    /// directly from the crashed one if relaxation failed).
    Quenched,
    /// Only the constrained relaxation completed.
    RelaxedOnly,
    /// Both sub-steps failed; the state was returned unchanged and recovery
    /// falls entirely to the next retry's step-count reduction.
    Ineffective,
}

/// Runs the fixed two-stage recovery protocol on a crashed geometry:
/// a short constrained energy relaxation, then a brief heavily-damped
/// low-temperature dynamics run.
pub struct StabilizationRunner<'a, E: SimulationEngine> {
    engine: &'a E,
    params: &'a StabilizationParams,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a, E: SimulationEngine> StabilizationRunner<'a, E> {
    pub fn new(
        engine: &'a E,
        params: &'a StabilizationParams,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            engine,
            params,
            reporter,
        }
    }

    /// Produces a candidate state believed to be numerically stable.
    ///
    /// Never fails: either sub-step may crash on an unsalvageable geometry,
    /// in which case the next sub-step (or the caller) proceeds from the
    /// best state seen so far, down to the unchanged input.
    pub fn stabilize(
        &self,
        crashed: ResumeState,
        sim_dir: &Path,
        attempt: u32,
    ) -> (ResumeState, StabilizationOutcome) {
        let first_aid_dir = sim_dir.join(FIRST_AID_DIR);
        if let Err(err) = fs::create_dir_all(&first_aid_dir) {
            warn!(
                dir = %first_aid_dir.display(),
                error = %err,
                "Could not create stabilization directory; resuming from the unmodified state."
            );
            return (crashed, StabilizationOutcome::Ineffective);
        }

        self.reporter.report(Progress::StatusUpdate {
            text: format!("Stabilizing crashed geometry (attempt {attempt})"),
        });

        let relaxed = match self
            .engine
            .run_step(&self.relaxation_spec(&crashed, &first_aid_dir, attempt))
        {
            Ok(state) => {
                info!(attempt, "Constrained relaxation completed.");
                Some(state)
            }
            Err(err) => {
                warn!(
                    attempt,
                    error = %err,
                    "Constrained relaxation failed; quenching from the crashed geometry directly."
                );
                None
            }
        };

        let quench_input = relaxed.clone().unwrap_or_else(|| crashed.clone());
        match self
            .engine
            .run_step(&self.quench_spec(&quench_input, &first_aid_dir, attempt))
        {
            Ok(state) => {
                info!(attempt, "Low-temperature quench completed.");
                (state, StabilizationOutcome::Quenched)
            }
            Err(err) => {
                warn!(attempt, error = %err, "Low-temperature quench failed.");
                match relaxed {
                    Some(state) => (state, StabilizationOutcome::RelaxedOnly),
                    None => {
                        warn!(
                            attempt,
                            "Stabilization ineffective; resuming from the unmodified state."
                        );
                        (crashed, StabilizationOutcome::Ineffective)
                    }
                }
            }
        }
    }

    fn relaxation_spec(
        &self,
        start: &ResumeState,
        first_aid_dir: &Path,
        attempt: u32,
    ) -> SimulationStepSpec {
        let p = self.params;
        SimulationStepSpec {
            name: format!("firstAid_relax_{attempt}"),
            kind: StepKind::EnergyRelaxation,
            total_steps: p.relaxation_max_iterations,
            start_state: start.clone(),
            output_dir: first_aid_dir.to_path_buf(),
            params: StepParameters {
                temperature_k: p.relaxation_temperature_k,
                timestep_fs: p.relaxation_timestep_fs,
                duration_ps: p.relaxation_duration_ps,
                log_interval_ps: p.log_interval_ps,
                max_iterations: p.relaxation_max_iterations,
            },
        }
    }

    fn quench_spec(
        &self,
        start: &ResumeState,
        first_aid_dir: &Path,
        attempt: u32,
    ) -> SimulationStepSpec {
        let p = self.params;
        SimulationStepSpec {
            name: format!("firstAid_quench_{attempt}"),
            kind: StepKind::ConstantTemperature,
            total_steps: SimulationStepSpec::steps_for(p.quench_duration_ps, p.quench_timestep_fs),
            start_state: start.clone(),
            output_dir: first_aid_dir.to_path_buf(),
            params: StepParameters {
                temperature_k: p.quench_temperature_k,
                timestep_fs: p.quench_timestep_fs,
                duration_ps: p.quench_duration_ps,
                log_interval_ps: p.log_interval_ps,
                max_iterations: 0,
            },
        }
    }
}
