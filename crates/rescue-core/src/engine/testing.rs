//! Scripted engine for exercising the recovery machinery without a real
//! integrator. Each `run_step` call consumes the next scripted action and
//! writes the same canonical artifacts a real engine would.

use super::error::StepError;
use super::sim::SimulationEngine;
use crate::core::models::spec::{SimulationStepSpec, StepKind, StepParameters};
use crate::core::models::state::ResumeState;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

pub(crate) enum RunResult {
    Succeed,
    Diverge(&'static str),
    Fail(&'static str),
}

pub(crate) struct ScriptedRun {
    pub result: RunResult,
    /// Step counter written into the canonical checkpoint; `None` models a
    /// crash before the first checkpoint interval.
    pub checkpoint_steps: Option<u64>,
    /// Step indices logged into the canonical report.
    pub report_rows: Vec<u64>,
}

impl ScriptedRun {
    pub fn succeed() -> Self {
        Self {
            result: RunResult::Succeed,
            checkpoint_steps: None,
            report_rows: Vec::new(),
        }
    }

    pub fn succeed_with_rows(report_rows: Vec<u64>) -> Self {
        Self {
            result: RunResult::Succeed,
            checkpoint_steps: None,
            report_rows,
        }
    }

    pub fn diverge(message: &'static str) -> Self {
        Self {
            result: RunResult::Diverge(message),
            checkpoint_steps: None,
            report_rows: Vec::new(),
        }
    }

    pub fn diverge_at(message: &'static str, checkpoint_steps: u64, report_rows: Vec<u64>) -> Self {
        Self {
            result: RunResult::Diverge(message),
            checkpoint_steps: Some(checkpoint_steps),
            report_rows,
        }
    }

    pub fn fail(message: &'static str) -> Self {
        Self {
            result: RunResult::Fail(message),
            checkpoint_steps: None,
            report_rows: Vec::new(),
        }
    }
}

pub(crate) struct ScriptedEngine {
    script: RefCell<VecDeque<ScriptedRun>>,
    /// Every spec the supervisor handed to `run_step`, in order.
    pub calls: RefCell<Vec<SimulationStepSpec>>,
    counter: RefCell<u32>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ScriptedRun>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: RefCell::new(Vec::new()),
            counter: RefCell::new(0),
        }
    }

    pub fn spec(name: &str, output_dir: &Path, total_steps: u64) -> SimulationStepSpec {
        SimulationStepSpec {
            name: name.to_string(),
            kind: StepKind::ConstantTemperature,
            total_steps,
            start_state: ResumeState::new(output_dir.join("previous_state.xml")),
            output_dir: output_dir.to_path_buf(),
            params: StepParameters {
                temperature_k: 300.0,
                timestep_fs: 2.0,
                duration_ps: total_steps as f64 * 0.002,
                log_interval_ps: 10.0,
                max_iterations: 0,
            },
        }
    }

    /// A resume state whose step counter reads back as `steps`.
    pub fn seeded_state(dir: &Path, steps: u64) -> ResumeState {
        let path = dir.join(format!("seeded_{steps}.chk"));
        fs::write(&path, steps.to_string()).unwrap();
        ResumeState::new(path)
    }

    pub fn remaining_runs(&self) -> usize {
        self.script.borrow().len()
    }
}

impl SimulationEngine for ScriptedEngine {
    fn run_step(&self, spec: &SimulationStepSpec) -> Result<ResumeState, StepError> {
        self.calls.borrow_mut().push(spec.clone());
        let run = self
            .script
            .borrow_mut()
            .pop_front()
            .expect("scripted engine ran out of runs");

        let dir = spec.step_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("trajectory.dcd"), format!("<{}>;", spec.name)).unwrap();
        if !run.report_rows.is_empty() {
            let mut body = String::from("#\"Step\",\"Potential Energy (kJ/mole)\"\n");
            for step in &run.report_rows {
                body.push_str(&format!("{step},-1.0\n"));
            }
            fs::write(dir.join("report.csv"), body).unwrap();
        }
        if let Some(steps) = run.checkpoint_steps {
            fs::write(dir.join("checkpoint.chk"), steps.to_string()).unwrap();
        }

        match run.result {
            RunResult::Succeed => {
                let n = {
                    let mut counter = self.counter.borrow_mut();
                    *counter += 1;
                    *counter
                };
                let state = dir.join(format!("state_{n}.xml"));
                fs::write(&state, "serialized state").unwrap();
                Ok(ResumeState::new(state))
            }
            RunResult::Diverge(message) => Err(StepError::NumericalDivergence(message.to_string())),
            RunResult::Fail(message) => Err(StepError::Unexpected(message.to_string())),
        }
    }

    fn read_step_count(&self, state: &ResumeState) -> Result<u64, StepError> {
        let content = fs::read_to_string(state.path()).map_err(|err| {
            StepError::CheckpointUnreadable {
                path: state.path().to_path_buf(),
                message: err.to_string(),
            }
        })?;
        content
            .trim()
            .parse()
            .map_err(|_| StepError::CheckpointUnreadable {
                path: state.path().to_path_buf(),
                message: format!("'{}' is not a step counter", content.trim()),
            })
    }
}
