use mdrescue::core::models::spec::StepKind;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level shape of a job configuration file.
///
/// One file describes one input system: where its outputs go, which state it
/// starts from, how to invoke the engine, and the ordered list of stages.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct JobFile {
    pub output_dir: PathBuf,
    pub start_state: PathBuf,
    pub engine: EngineSection,
    #[serde(default)]
    pub recovery: RecoverySection,
    #[serde(rename = "stage")]
    pub stages: Vec<StageSection>,
}

/// How to invoke the external simulation engine executable.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct EngineSection {
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Exit code the engine uses to report numerical divergence, as opposed
    /// to an ordinary failure.
    #[serde(default = "default_divergence_exit_code")]
    pub divergence_exit_code: i32,
}

fn default_divergence_exit_code() -> i32 {
    3
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RecoverySection {
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub stabilization: StabilizationSection,
}

/// Optional overrides for the stabilization protocol. Unset fields keep
/// their built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StabilizationSection {
    pub relaxation_max_iterations: Option<u64>,
    pub relaxation_duration_ps: Option<f64>,
    pub relaxation_timestep_fs: Option<f64>,
    pub relaxation_temperature_k: Option<f64>,
    pub quench_duration_ps: Option<f64>,
    pub quench_timestep_fs: Option<f64>,
    pub quench_temperature_k: Option<f64>,
    pub log_interval_ps: Option<f64>,
}

/// One `[[stage]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct StageSection {
    pub name: String,
    pub kind: StepKind,
    /// Required for dynamics stages; ignored by energy relaxation.
    pub duration_ps: Option<f64>,
    /// Required for dynamics stages; ignored by energy relaxation.
    pub timestep_fs: Option<f64>,
    pub temperature_k: f64,
    #[serde(default = "default_log_interval_ps")]
    pub log_interval_ps: f64,
    /// Iteration bound for energy relaxation stages. `0` means run until
    /// convergence.
    pub max_iterations: Option<u64>,
}

fn default_log_interval_ps() -> f64 {
    10.0
}
