use super::accountant;
use super::config::RecoveryConfig;
use super::error::{RecoveryError, StepError};
use super::progress::{Progress, ProgressReporter};
use super::sim::SimulationEngine;
use super::stabilize::StabilizationRunner;
use crate::core::io::artifacts::{self, QuarantinedArtifactSet};
use crate::core::io::splice;
use crate::core::models::attempt::{AttemptOutcome, AttemptRecord};
use crate::core::models::spec::SimulationStepSpec;
use crate::core::models::state::ResumeState;
use tracing::{error, info};

/// Control states of the retry loop.
#[derive(Debug)]
enum SupervisorState {
    Running,
    Recovering { crash: String },
    Succeeded { final_state: ResumeState },
    Exhausted { last: StepError },
    FatalAborted { source: StepError },
}

/// The result of a supervised step: its final state plus the bookkeeping of
/// every recovery attempt that was needed along the way.
#[derive(Debug)]
pub struct RecoveryOutcome {
    pub final_state: ResumeState,
    pub attempts: Vec<AttemptRecord>,
}

impl RecoveryOutcome {
    /// Number of recovery attempts that were made.
    pub fn retries(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Supervises one simulation step, recovering from numerical divergence up
/// to the configured retry bound.
///
/// On a recoverable crash the supervisor quarantines the attempt's outputs,
/// recovers its latest checkpoint (falling back to the attempt's own input
/// state), credits the steps it completed, stabilizes the crashed geometry,
/// and re-invokes the step with the remaining step budget. On eventual
/// success after at least one retry, the quarantined partial outputs are
/// spliced with the final output into one continuous result.
pub struct RetrySupervisor<'a, E: SimulationEngine> {
    engine: &'a E,
    config: &'a RecoveryConfig,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a, E: SimulationEngine> RetrySupervisor<'a, E> {
    pub fn new(
        engine: &'a E,
        config: &'a RecoveryConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            engine,
            config,
            reporter,
        }
    }

    pub fn run(&self, spec: SimulationStepSpec) -> Result<RecoveryOutcome, RecoveryError> {
        let step_name = spec.name.clone();
        let sim_dir = spec.step_dir();
        let max_retries = self.config.max_retries;

        let mut current = spec;
        let mut attempt: u32 = 0;
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut quarantined: Vec<QuarantinedArtifactSet> = Vec::new();
        let mut state = SupervisorState::Running;

        loop {
            state = match state {
                SupervisorState::Running => {
                    self.reporter.report(Progress::AttemptStart {
                        attempt,
                        max_retries,
                    });
                    match self.engine.run_step(&current) {
                        Ok(final_state) => SupervisorState::Succeeded { final_state },
                        Err(source) if !source.is_recoverable() => {
                            SupervisorState::FatalAborted { source }
                        }
                        // Recovery explicitly disabled: surface the first
                        // divergence without touching the crashed outputs.
                        Err(source) if max_retries == 0 => {
                            SupervisorState::FatalAborted { source }
                        }
                        Err(last) if attempt >= max_retries => SupervisorState::Exhausted { last },
                        Err(crash) => SupervisorState::Recovering {
                            crash: crash.to_string(),
                        },
                    }
                }

                SupervisorState::Recovering { crash } => {
                    attempt += 1;
                    info!(
                        step = %step_name,
                        attempt,
                        max_retries,
                        crash = %crash,
                        "Numerical divergence detected; attempting recovery."
                    );
                    self.reporter.report(Progress::Message(format!(
                        "Attempting recovery, try {attempt} of {max_retries}"
                    )));

                    let artifacts = artifacts::quarantine(&sim_dir, attempt).map_err(|source| {
                        RecoveryError::Quarantine {
                            dir: sim_dir.clone(),
                            source,
                        }
                    })?;

                    let crashed_state = match artifacts::locate_checkpoint(&sim_dir, attempt) {
                        Some(checkpoint) => checkpoint,
                        None => {
                            // Crashed before the first checkpoint interval:
                            // retry from the attempt's own starting point.
                            info!(
                                step = %step_name,
                                attempt,
                                "No checkpoint for the crashed attempt; restarting from its input state."
                            );
                            current.start_state.clone()
                        }
                    };

                    let completed =
                        accountant::count_completed_steps(self.engine, &crashed_state, &current);
                    let runner = StabilizationRunner::new(
                        self.engine,
                        &self.config.stabilization,
                        self.reporter,
                    );
                    let (stabilized, outcome) =
                        runner.stabilize(crashed_state, &sim_dir, attempt);

                    let remaining = current.total_steps.saturating_sub(completed);
                    info!(
                        step = %step_name,
                        attempt,
                        completed,
                        remaining,
                        stabilization = ?outcome,
                        "Resuming with adjusted parameters."
                    );

                    attempts.push(AttemptRecord::new(
                        attempt,
                        crash,
                        sim_dir.clone(),
                        stabilized.path().to_path_buf(),
                        completed,
                    ));
                    quarantined.push(artifacts);
                    current = current.resumed_from(stabilized, remaining);
                    SupervisorState::Running
                }

                SupervisorState::Succeeded { final_state } => {
                    if attempt > 0 {
                        if let Some(record) = attempts.last_mut() {
                            record.record_outcome(AttemptOutcome::Recovered);
                        }
                        info!(
                            step = %step_name,
                            retries = attempt,
                            "Step recovered; merging partial outputs."
                        );
                        self.reporter
                            .report(Progress::Message(format!("Success after {attempt} tries.")));
                        splice::merge_partial_outputs(&sim_dir, &quarantined).map_err(
                            |source| RecoveryError::Splice {
                                step: step_name.clone(),
                                source,
                            },
                        )?;
                    }
                    return Ok(RecoveryOutcome {
                        final_state,
                        attempts,
                    });
                }

                SupervisorState::Exhausted { last } => {
                    if let Some(record) = attempts.last_mut() {
                        record.record_outcome(AttemptOutcome::Exhausted);
                    }
                    error!(
                        step = %step_name,
                        attempts = attempt,
                        "Max retries reached. Stopping."
                    );
                    self.reporter
                        .report(Progress::Message("Max retries reached. Stopping.".to_string()));
                    return Err(RecoveryError::RetriesExhausted {
                        step: step_name,
                        attempts: attempt,
                        last_crash: last.to_string(),
                    });
                }

                SupervisorState::FatalAborted { source } => {
                    if let Some(record) = attempts.last_mut() {
                        record.record_outcome(AttemptOutcome::Fatal);
                    }
                    error!(
                        step = %step_name,
                        attempt,
                        error = %source,
                        "Unrecoverable failure; aborting."
                    );
                    return Err(RecoveryError::FatalAborted {
                        step: step_name,
                        attempt,
                        source,
                    });
                }
            };
        }
    }
}
