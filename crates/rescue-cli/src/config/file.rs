use super::models::{EngineSection, JobFile, StabilizationSection, StageSection};
use crate::error::{CliError, Result};
use mdrescue::core::models::spec::{SimulationStepSpec, StepKind, StepParameters};
use mdrescue::core::models::state::ResumeState;
use mdrescue::engine::config::{RecoveryConfig, RecoveryConfigBuilder, StabilizationParams};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A fully validated job configuration, ready to hand to the pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub recovery: RecoveryConfig,
    pub stages: Vec<SimulationStepSpec>,
}

/// Loads and validates a job configuration file.
pub fn load_job(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: anyhow::Error::new(e),
    })?;
    let file: JobFile = toml::from_str(&raw).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: anyhow::Error::new(e),
    })?;
    debug!(job = %path.display(), stages = file.stages.len(), "Parsed job file.");

    validate(&file)?;

    let recovery = {
        let mut builder = RecoveryConfigBuilder::new()
            .stabilization(stabilization_params(&file.recovery.stabilization));
        if let Some(retries) = file.recovery.max_retries {
            builder = builder.max_retries(retries);
        }
        builder.build()
    };

    let start_state = ResumeState::new(&file.start_state);
    let stages = file
        .stages
        .iter()
        .map(|stage| stage_spec(stage, &file, start_state.clone()))
        .collect::<Result<Vec<_>>>()?;

    Ok(AppConfig {
        engine: file.engine,
        recovery,
        stages,
    })
}

fn validate(file: &JobFile) -> Result<()> {
    if file.stages.is_empty() {
        return Err(CliError::Config(
            "job configuration must define at least one [[stage]]".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for stage in &file.stages {
        if stage.name.trim().is_empty() {
            return Err(CliError::Config("stage names must not be empty".to_string()));
        }
        if !seen.insert(stage.name.as_str()) {
            return Err(CliError::Config(format!(
                "duplicate stage name '{}'",
                stage.name
            )));
        }
        if stage.temperature_k < 0.0 {
            return Err(CliError::Config(format!(
                "stage '{}': temperature must be non-negative",
                stage.name
            )));
        }
        if stage.kind != StepKind::EnergyRelaxation {
            match (stage.duration_ps, stage.timestep_fs) {
                (Some(d), Some(t)) if d > 0.0 && t > 0.0 => {}
                _ => {
                    return Err(CliError::Config(format!(
                        "stage '{}': dynamics stages require positive duration-ps and timestep-fs",
                        stage.name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn stage_spec(
    stage: &StageSection,
    file: &JobFile,
    start_state: ResumeState,
) -> Result<SimulationStepSpec> {
    // Validation has already established that dynamics stages carry positive
    // duration and timestep values.
    let (duration_ps, timestep_fs, total_steps, max_iterations) =
        if stage.kind == StepKind::EnergyRelaxation {
            let iterations = stage.max_iterations.unwrap_or(0);
            (
                stage.duration_ps.unwrap_or(0.0),
                stage.timestep_fs.unwrap_or(0.0),
                iterations,
                iterations,
            )
        } else {
            let duration = stage.duration_ps.unwrap_or(0.0);
            let timestep = stage.timestep_fs.unwrap_or(0.0);
            (
                duration,
                timestep,
                SimulationStepSpec::steps_for(duration, timestep),
                0,
            )
        };

    Ok(SimulationStepSpec {
        name: stage.name.clone(),
        kind: stage.kind,
        total_steps,
        start_state,
        output_dir: file.output_dir.clone(),
        params: StepParameters {
            temperature_k: stage.temperature_k,
            timestep_fs,
            duration_ps,
            log_interval_ps: stage.log_interval_ps,
            max_iterations,
        },
    })
}

fn stabilization_params(section: &StabilizationSection) -> StabilizationParams {
    let d = StabilizationParams::default();
    StabilizationParams {
        relaxation_max_iterations: section
            .relaxation_max_iterations
            .unwrap_or(d.relaxation_max_iterations),
        relaxation_duration_ps: section
            .relaxation_duration_ps
            .unwrap_or(d.relaxation_duration_ps),
        relaxation_timestep_fs: section
            .relaxation_timestep_fs
            .unwrap_or(d.relaxation_timestep_fs),
        relaxation_temperature_k: section
            .relaxation_temperature_k
            .unwrap_or(d.relaxation_temperature_k),
        quench_duration_ps: section.quench_duration_ps.unwrap_or(d.quench_duration_ps),
        quench_timestep_fs: section.quench_timestep_fs.unwrap_or(d.quench_timestep_fs),
        quench_temperature_k: section
            .quench_temperature_k
            .unwrap_or(d.quench_temperature_k),
        log_interval_ps: section.log_interval_ps.unwrap_or(d.log_interval_ps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_JOB: &str = r#"
        output-dir = "runs/sys1"
        start-state = "prep/sys1_state.xml"

        [engine]
        command = "/opt/md/bin/md-engine"
        args = ["--platform", "CUDA"]

        [recovery]
        max-retries = 4

        [recovery.stabilization]
        quench-temperature-k = 5.0

        [[stage]]
        name = "minimize"
        kind = "energy-relaxation"
        temperature-k = 300.0
        max-iterations = 2000

        [[stage]]
        name = "production"
        kind = "constant-pressure"
        duration-ps = 100.0
        timestep-fs = 2.0
        temperature-k = 300.0
    "#;

    fn write_job(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_a_complete_job_file() {
        let f = write_job(FULL_JOB);
        let app = load_job(f.path()).unwrap();

        assert_eq!(app.recovery.max_retries, 4);
        assert_eq!(app.recovery.stabilization.quench_temperature_k, 5.0);
        // Untouched stabilization fields keep their defaults.
        assert_eq!(app.recovery.stabilization.quench_timestep_fs, 0.1);
        assert_eq!(app.engine.divergence_exit_code, 3);

        assert_eq!(app.stages.len(), 2);
        assert_eq!(app.stages[0].name, "minimize");
        assert_eq!(app.stages[0].total_steps, 2000);
        assert_eq!(app.stages[1].total_steps, 50_000);
        assert_eq!(
            app.stages[1].start_state.path(),
            Path::new("prep/sys1_state.xml")
        );
    }

    #[test]
    fn rejects_duplicate_stage_names() {
        let f = write_job(
            r#"
            output-dir = "runs/sys1"
            start-state = "prep/state.xml"
            [engine]
            command = "md-engine"
            [[stage]]
            name = "production"
            kind = "constant-temperature"
            duration-ps = 10.0
            timestep-fs = 2.0
            temperature-k = 300.0
            [[stage]]
            name = "production"
            kind = "constant-pressure"
            duration-ps = 10.0
            timestep-fs = 2.0
            temperature-k = 300.0
        "#,
        );
        let err = load_job(f.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("duplicate stage name")));
    }

    #[test]
    fn rejects_dynamics_stages_without_a_timestep() {
        let f = write_job(
            r#"
            output-dir = "runs/sys1"
            start-state = "prep/state.xml"
            [engine]
            command = "md-engine"
            [[stage]]
            name = "production"
            kind = "constant-pressure"
            duration-ps = 10.0
            temperature-k = 300.0
        "#,
        );
        let err = load_job(f.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let f = write_job(
            r#"
            output-dir = "runs/sys1"
            start-state = "prep/state.xml"
            surprise = true
            [engine]
            command = "md-engine"
            [[stage]]
            name = "production"
            kind = "constant-pressure"
            duration-ps = 10.0
            timestep-fs = 2.0
            temperature-k = 300.0
        "#,
        );
        let err = load_job(f.path()).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_job(Path::new("/nonexistent/job.toml")).unwrap_err();
        match err {
            CliError::FileParsing { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/job.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
