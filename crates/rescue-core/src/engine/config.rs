/// Fallback retry bound when the configuration does not set one.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Tunable parameters of the two stabilization sub-steps.
///
/// These are deliberately conservative and independent of the crashed
/// stage's production parameters: a bounded constrained relaxation, then a
/// short heavily-damped run near 0 K with a timestep an order of magnitude
/// below production.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizationParams {
    pub relaxation_max_iterations: u64,
    pub relaxation_duration_ps: f64,
    pub relaxation_timestep_fs: f64,
    pub relaxation_temperature_k: f64,
    pub quench_duration_ps: f64,
    pub quench_timestep_fs: f64,
    pub quench_temperature_k: f64,
    pub log_interval_ps: f64,
}

impl Default for StabilizationParams {
    fn default() -> Self {
        Self {
            relaxation_max_iterations: 1_000,
            relaxation_duration_ps: 10.0,
            relaxation_timestep_fs: 0.5,
            relaxation_temperature_k: 300.0,
            quench_duration_ps: 100.0,
            quench_timestep_fs: 0.1,
            quench_temperature_k: 10.0,
            log_interval_ps: 1.0,
        }
    }
}

/// Configuration for the retry supervisor.
///
/// `max_retries` bounds the number of recovery attempts per step;
/// `0` disables recovery entirely, so the first crash is terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryConfig {
    pub max_retries: u32,
    pub stabilization: StabilizationParams,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            stabilization: StabilizationParams::default(),
        }
    }
}

#[derive(Default)]
pub struct RecoveryConfigBuilder {
    max_retries: Option<u32>,
    stabilization: Option<StabilizationParams>,
}

impl RecoveryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn stabilization(mut self, params: StabilizationParams) -> Self {
        self.stabilization = Some(params);
        self
    }

    pub fn build(self) -> RecoveryConfig {
        RecoveryConfig {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            stabilization: self.stabilization.unwrap_or_default(),
        }
    }
}
