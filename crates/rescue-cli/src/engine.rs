use crate::config::models::EngineSection;
use mdrescue::core::models::spec::SimulationStepSpec;
use mdrescue::core::models::state::ResumeState;
use mdrescue::engine::error::StepError;
use mdrescue::engine::sim::SimulationEngine;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Serialized final state the engine leaves behind in the step directory.
const STATE_FILE: &str = "state.xml";
/// Stage spec handed to the engine process.
const SPEC_FILE: &str = "step.toml";

/// A [`SimulationEngine`] backed by an external engine executable.
///
/// Protocol: `<command> [args..] run --spec <file>` integrates one stage,
/// writing its trajectory, report, and checkpoint artifacts plus a final
/// `state.xml` into the stage directory. Exit code 0 reports success and the
/// configured divergence code reports numerical divergence; anything else is
/// an ordinary failure. `<command> [args..] inspect --state <file>` prints
/// the state's integer step counter on stdout.
pub struct ProcessEngine {
    command: PathBuf,
    args: Vec<String>,
    divergence_exit_code: i32,
}

impl ProcessEngine {
    pub fn new(command: PathBuf, args: Vec<String>, divergence_exit_code: i32) -> Self {
        Self {
            command,
            args,
            divergence_exit_code,
        }
    }

    pub fn from_config(section: &EngineSection) -> Self {
        Self::new(
            section.command.clone(),
            section.args.clone(),
            section.divergence_exit_code,
        )
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd
    }
}

impl SimulationEngine for ProcessEngine {
    fn run_step(&self, spec: &SimulationStepSpec) -> Result<ResumeState, StepError> {
        let step_dir = spec.step_dir();
        fs::create_dir_all(&step_dir)?;

        let spec_path = step_dir.join(SPEC_FILE);
        let serialized = toml::to_string_pretty(spec)
            .map_err(|e| StepError::Unexpected(format!("failed to serialize stage spec: {e}")))?;
        fs::write(&spec_path, serialized)?;

        info!(
            stage = %spec.name,
            steps = spec.total_steps,
            engine = %self.command.display(),
            "Launching engine process."
        );
        let output = self
            .base_command()
            .arg("run")
            .arg("--spec")
            .arg(&spec_path)
            .output()?;

        match output.status.code() {
            Some(0) => {
                debug!(stage = %spec.name, "Engine process finished cleanly.");
                Ok(ResumeState::new(step_dir.join(STATE_FILE)))
            }
            Some(code) if code == self.divergence_exit_code => Err(
                StepError::NumericalDivergence(stderr_tail(&output.stderr)),
            ),
            Some(code) => Err(StepError::Unexpected(format!(
                "engine exited with code {code}: {}",
                stderr_tail(&output.stderr)
            ))),
            None => Err(StepError::Unexpected(format!(
                "engine terminated by signal: {}",
                stderr_tail(&output.stderr)
            ))),
        }
    }

    fn read_step_count(&self, state: &ResumeState) -> Result<u64, StepError> {
        let output = self
            .base_command()
            .arg("inspect")
            .arg("--state")
            .arg(state.path())
            .output()?;

        if !output.status.success() {
            return Err(StepError::CheckpointUnreadable {
                path: state.path().to_path_buf(),
                message: stderr_tail(&output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<u64>()
            .map_err(|_| StepError::CheckpointUnreadable {
                path: state.path().to_path_buf(),
                message: format!("unparseable step counter: '{}'", stdout.trim()),
            })
    }
}

/// Last non-empty stderr line, as the crash diagnostic.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("engine produced no diagnostics")
        .to_string()
}
