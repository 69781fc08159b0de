use super::state::ResumeState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The physical ensemble a simulation stage runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    EnergyRelaxation,
    ConstantTemperature,
    ConstantPressure,
    EnhancedSampling,
}

/// Stage-specific numeric parameters.
///
/// Durations are carried alongside the derived step count so the engine can
/// reproduce logging and checkpoint intervals on its side of the seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepParameters {
    pub temperature_k: f64,
    pub timestep_fs: f64,
    pub duration_ps: f64,
    pub log_interval_ps: f64,
    /// Iteration bound for energy relaxation stages; dynamics stages ignore it.
    pub max_iterations: u64,
}

/// One configured stage of a multi-stage simulation run.
///
/// Built once from validated configuration. The retry supervisor is the only
/// component that derives modified copies: each retry consumes strictly the
/// step budget left over from its crashed predecessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationStepSpec {
    /// Stage name, unique within a run.
    pub name: String,
    pub kind: StepKind,
    /// Number of integration steps the engine is asked to perform.
    pub total_steps: u64,
    /// Serialized state the engine starts integrating from.
    pub start_state: ResumeState,
    /// Run-level output directory; the engine writes this stage's artifacts
    /// into the `name` subdirectory below it.
    pub output_dir: PathBuf,
    pub params: StepParameters,
}

impl SimulationStepSpec {
    /// Directory the engine writes this stage's artifacts into.
    pub fn step_dir(&self) -> PathBuf {
        self.output_dir.join(&self.name)
    }

    /// Derives the spec for a recovery attempt: same stage, reduced step
    /// budget, restarted from a stabilized state.
    pub(crate) fn resumed_from(&self, start_state: ResumeState, remaining_steps: u64) -> Self {
        Self {
            start_state,
            total_steps: remaining_steps,
            ..self.clone()
        }
    }

    /// Converts a wall-clock duration into an integration step count.
    pub fn steps_for(duration_ps: f64, timestep_fs: f64) -> u64 {
        ((duration_ps * 1000.0) / timestep_fs).round() as u64
    }
}
