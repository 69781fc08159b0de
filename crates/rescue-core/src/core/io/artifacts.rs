use crate::core::models::state::ResumeState;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trajectory frames written by the engine.
pub const TRAJECTORY_EXT: &str = "dcd";
/// Tabular progress report rows.
pub const REPORT_EXT: &str = "csv";
/// Periodic resume checkpoints.
pub const CHECKPOINT_EXT: &str = "chk";

/// Infix embedded in quarantined file names: `<stem>_partial_<attempt>.<ext>`.
const PARTIAL_TAG: &str = "_partial_";

/// The output files renamed away from their canonical names after a crash,
/// tagged with the attempt that produced them so a later merge can stitch
/// them back in order.
#[derive(Debug, Clone)]
pub struct QuarantinedArtifactSet {
    pub attempt: u32,
    pub trajectories: Vec<PathBuf>,
    pub reports: Vec<PathBuf>,
    pub checkpoints: Vec<PathBuf>,
}

impl QuarantinedArtifactSet {
    fn empty(attempt: u32) -> Self {
        Self {
            attempt,
            trajectories: Vec::new(),
            reports: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty() && self.reports.is_empty() && self.checkpoints.is_empty()
    }
}

/// Renames every recognized output file in `output_dir` so the next attempt
/// cannot overwrite it, embedding `attempt` in each name.
///
/// Already-tagged files are skipped, so calling this twice for the same
/// attempt performs no additional renames. Nothing is ever deleted.
///
/// A missing `output_dir` is a precondition violation: the crashed step must
/// have run at least once to produce its directory.
pub fn quarantine(output_dir: &Path, attempt: u32) -> io::Result<QuarantinedArtifactSet> {
    if !output_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "simulation output directory '{}' does not exist",
                output_dir.display()
            ),
        ));
    }

    let mut set = QuarantinedArtifactSet::empty(attempt);
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.contains(PARTIAL_TAG) {
            continue;
        }

        let path = entry.path();
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };
        let bucket = match ext {
            TRAJECTORY_EXT => &mut set.trajectories,
            REPORT_EXT => &mut set.reports,
            CHECKPOINT_EXT => &mut set.checkpoints,
            _ => continue,
        };

        let quarantined = output_dir.join(partial_file_name(stem, attempt, ext));
        debug!(
            from = %path.display(),
            to = %quarantined.display(),
            "Quarantining crashed output file."
        );
        fs::rename(&path, &quarantined)?;
        bucket.push(quarantined);
    }

    set.trajectories.sort();
    set.reports.sort();
    set.checkpoints.sort();
    Ok(set)
}

/// Finds the checkpoint quarantined for `attempt`, if the engine wrote one
/// before the crash.
///
/// `None` is the expected outcome when the crash preceded the first
/// checkpoint interval; callers retry from the failed attempt's own input
/// state in that case.
pub fn locate_checkpoint(output_dir: &Path, attempt: u32) -> Option<ResumeState> {
    let suffix = format!("{PARTIAL_TAG}{attempt}.{CHECKPOINT_EXT}");
    let mut candidates: Vec<PathBuf> = fs::read_dir(output_dir)
        .ok()?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            if path.is_file() && name.ends_with(&suffix) {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next().map(ResumeState::new)
}

/// `<stem>_partial_<attempt>.<ext>`, the quarantine naming convention.
pub(crate) fn partial_file_name(stem: &str, attempt: u32, ext: &str) -> String {
    format!("{stem}{PARTIAL_TAG}{attempt}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn quarantine_renames_recognized_outputs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "trajectory.dcd");
        touch(dir.path(), "report.csv");
        touch(dir.path(), "checkpoint.chk");
        touch(dir.path(), "notes.txt");

        let set = quarantine(dir.path(), 1).unwrap();

        assert_eq!(set.attempt, 1);
        assert_eq!(set.trajectories, vec![dir.path().join("trajectory_partial_1.dcd")]);
        assert_eq!(set.reports, vec![dir.path().join("report_partial_1.csv")]);
        assert_eq!(set.checkpoints, vec![dir.path().join("checkpoint_partial_1.chk")]);
        assert!(set.trajectories[0].is_file());
        assert!(!dir.path().join("trajectory.dcd").exists());
        // Unrecognized extensions are left alone.
        assert!(dir.path().join("notes.txt").is_file());
    }

    #[test]
    fn quarantine_is_idempotent_for_already_tagged_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "trajectory.dcd");
        touch(dir.path(), "report.csv");

        quarantine(dir.path(), 1).unwrap();
        let second = quarantine(dir.path(), 1).unwrap();

        assert!(second.is_empty());
        assert!(dir.path().join("trajectory_partial_1.dcd").is_file());
        assert!(dir.path().join("report_partial_1.csv").is_file());
    }

    #[test]
    fn quarantine_keeps_earlier_attempts_untouched() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "report.csv");
        quarantine(dir.path(), 1).unwrap();

        touch(dir.path(), "report.csv");
        let set = quarantine(dir.path(), 2).unwrap();

        assert_eq!(set.reports, vec![dir.path().join("report_partial_2.csv")]);
        assert!(dir.path().join("report_partial_1.csv").is_file());
    }

    #[test]
    fn quarantine_fails_on_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("never_ran");

        let err = quarantine(&missing, 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn locate_checkpoint_finds_the_attempts_tag() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "checkpoint_partial_1.chk");
        touch(dir.path(), "checkpoint_partial_2.chk");

        let found = locate_checkpoint(dir.path(), 2).unwrap();
        assert_eq!(found.path(), dir.path().join("checkpoint_partial_2.chk"));
    }

    #[test]
    fn locate_checkpoint_returns_none_when_crash_preceded_first_checkpoint() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "trajectory_partial_1.dcd");

        assert!(locate_checkpoint(dir.path(), 1).is_none());
    }
}
