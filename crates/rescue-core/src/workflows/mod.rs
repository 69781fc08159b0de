//! # Workflows Module
//!
//! High-level entry points that tie the engine and core layers together.
//!
//! - **Supervised Step** ([`recover`]) - Runs one simulation step under
//!   crash-recovery supervision; the surface consumed by batch dispatch.
//! - **Pipeline** ([`pipeline`]) - Runs an ordered list of stages, threading
//!   each stage's final state into the next.

pub mod pipeline;
pub mod recover;
