use super::sim::SimulationEngine;
use crate::core::models::spec::SimulationStepSpec;
use crate::core::models::state::ResumeState;
use tracing::{debug, warn};

/// Determines how many integration steps a crashed attempt completed before
/// it died, by reading the step counter back out of its recovered state.
///
/// Any failure to load the state credits zero completed steps. That is the
/// conservative choice: the next attempt redoes work instead of silently
/// under-counting and truncating real remaining dynamics.
pub fn count_completed_steps<E: SimulationEngine>(
    engine: &E,
    state: &ResumeState,
    spec: &SimulationStepSpec,
) -> u64 {
    match engine.read_step_count(state) {
        Ok(steps) => {
            debug!(step = %spec.name, completed = steps, "Read step counter from crashed state.");
            steps
        }
        Err(err) => {
            warn!(
                step = %spec.name,
                state = %state,
                error = %err,
                "Could not read step counter from crashed state; crediting no progress."
            );
            0
        }
    }
}
