use super::error::StepError;
use crate::core::models::spec::SimulationStepSpec;
use crate::core::models::state::ResumeState;

/// The seam to the external simulation engine.
///
/// The orchestrator treats integration as an opaque capability: run the
/// requested number of steps from a serialized state, writing trajectory,
/// tabular report, and periodic checkpoint files into the step directory,
/// and either complete or signal abnormal termination. Checkpoint files are
/// engine-opaque blobs; the only requirement is that one can be loaded back
/// into a fresh context to read an integer step counter.
pub trait SimulationEngine {
    /// Runs one simulation step to completion, returning a reference to the
    /// final serialized state.
    fn run_step(&self, spec: &SimulationStepSpec) -> Result<ResumeState, StepError>;

    /// Loads `state` into a fresh minimal context and reads back its
    /// internal step counter.
    fn read_step_count(&self, state: &ResumeState) -> Result<u64, StepError>;
}
