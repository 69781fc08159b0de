//! Filesystem conventions shared with the external simulation engine.
//!
//! The engine writes a trajectory, a tabular progress report, and periodic
//! checkpoints into each stage's directory under canonical names. This
//! module owns everything the orchestrator does to those files: renaming
//! them out of the way after a crash, finding the checkpoint of a crashed
//! attempt, and splicing partial outputs back into one continuous result.

pub mod artifacts;
pub mod splice;
