use crate::core::io::splice::SpliceError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a simulation step terminated abnormally.
///
/// Only [`StepError::NumericalDivergence`] is eligible for automated
/// recovery; every other class propagates to the caller unchanged.
#[derive(Debug, Error)]
pub enum StepError {
    /// The engine detected an unphysical state: non-finite particle
    /// coordinates, solver divergence.
    #[error("numerical divergence: {0}")]
    NumericalDivergence(String),

    /// A serialized state could not be loaded back into a fresh context.
    #[error("state '{path}' could not be read: {message}", path = path.display())]
    CheckpointUnreadable { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the engine reports.
    #[error("{0}")]
    Unexpected(String),
}

impl StepError {
    /// Whether the retry supervisor may attempt recovery from this failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NumericalDivergence(_))
    }
}

/// Terminal failures of a supervised step.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// An unrecoverable failure, surfaced immediately without recovery.
    #[error("step '{step}' aborted on attempt {attempt}: {source}")]
    FatalAborted {
        step: String,
        attempt: u32,
        #[source]
        source: StepError,
    },

    /// The retry bound ran out while the step kept diverging.
    #[error("step '{step}' abandoned after {attempts} recovery attempts; last crash: {last_crash}")]
    RetriesExhausted {
        step: String,
        attempts: u32,
        last_crash: String,
    },

    /// The crashed attempt's outputs could not be renamed out of the way.
    #[error("failed to quarantine crashed outputs under '{dir}': {source}", dir = dir.display())]
    Quarantine {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Partial outputs could not be merged after an eventual success.
    #[error("failed to merge partial outputs for step '{step}': {source}")]
    Splice {
        step: String,
        #[source]
        source: SpliceError,
    },
}
