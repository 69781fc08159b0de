//! # mdrescue Core Library
//!
//! Crash-recovery orchestration for molecular dynamics simulation pipelines.
//!
//! The numerically intensive integration work is delegated to an external
//! simulation engine; this library supervises it. When a long-running step
//! dies of numerical divergence (exploding particle coordinates, solver
//! blow-up), the orchestrator quarantines the crashed attempt's outputs,
//! recovers the most recent checkpoint, runs a short stabilization protocol
//! on the crashed geometry, and resumes the step with the remaining step
//! budget, finally splicing the partial outputs into one continuous
//! trajectory/report pair.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture so each concern stays
//! modular and testable:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SimulationStepSpec`,
//!   `ResumeState`, `AttemptRecord`) and the filesystem conventions for
//!   artifact quarantine and output splicing.
//!
//! - **[`engine`]: The Logic Core.** The stateful recovery machinery: the
//!   [`engine::sim::SimulationEngine`] seam to the external integrator, step
//!   accounting, the stabilization protocol runner, and the retry supervisor
//!   state machine.
//!
//! - **[`workflows`]: The Public API.** High-level entry points that tie the
//!   engine and core together: supervised execution of a single step, and
//!   sequential multi-stage pipelines.

pub mod core;
pub mod engine;
pub mod workflows;
