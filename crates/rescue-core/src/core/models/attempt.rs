use std::path::PathBuf;

/// How a recovery attempt ultimately ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The retried step ran to completion.
    Recovered,
    /// The retry bound ran out before the step completed.
    Exhausted,
    /// The step died of an unrecoverable failure.
    Fatal,
}

/// Bookkeeping for one retry of a crashed simulation stage.
///
/// Created when the supervisor enters recovery; immutable afterwards except
/// for recording the outcome once it is known.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based retry index; also the quarantine tag embedded in renamed
    /// artifact names.
    pub index: u32,
    /// Diagnostic of the crash that triggered this attempt.
    pub crash: String,
    /// Directory whose artifacts were quarantined.
    pub quarantine_dir: PathBuf,
    /// Path of the stabilized state the retried step started from.
    pub resumed_from: PathBuf,
    /// Integration steps credited to the crashed predecessor.
    pub prior_steps_credited: u64,
    outcome: Option<AttemptOutcome>,
}

impl AttemptRecord {
    pub fn new(
        index: u32,
        crash: String,
        quarantine_dir: PathBuf,
        resumed_from: PathBuf,
        prior_steps_credited: u64,
    ) -> Self {
        Self {
            index,
            crash,
            quarantine_dir,
            resumed_from,
            prior_steps_credited,
            outcome: None,
        }
    }

    pub fn outcome(&self) -> Option<AttemptOutcome> {
        self.outcome
    }

    /// Records the attempt's outcome. The first recorded outcome wins.
    pub(crate) fn record_outcome(&mut self, outcome: AttemptOutcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }
}
