use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// An opaque reference to a serialized physical state (positions, velocities,
/// box vectors) usable as the starting point of a simulation step.
///
/// The referenced file is owned by whichever component currently holds the
/// value: the checkpoint locator hands it to the stabilization runner, which
/// hands its (possibly replaced) result to the supervisor, which feeds it
/// into the next engine invocation. At most one candidate state is in flight
/// per supervisor loop at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeState(PathBuf);

impl ResumeState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl From<PathBuf> for ResumeState {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl fmt::Display for ResumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
