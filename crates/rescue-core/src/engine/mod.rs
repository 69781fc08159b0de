//! # Engine Module
//!
//! Implements the stateful recovery machinery that supervises one simulation
//! step from invocation through crash classification, checkpoint recovery,
//! stabilization, and resumption.
//!
//! ## Architecture
//!
//! - **Engine Seam** ([`sim`]) - The trait boundary to the external
//!   simulation engine that performs the actual integration.
//! - **Configuration** ([`config`]) - Retry bound and stabilization tunables.
//! - **Step Accounting** ([`accountant`]) - Credits completed integration
//!   steps to a crashed attempt from its checkpoint.
//! - **Stabilization** ([`stabilize`]) - The fixed two-stage recovery
//!   protocol applied to a crashed geometry before resuming.
//! - **Supervision** ([`recovery`]) - The retry state machine driving all of
//!   the above.
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting for
//!   user feedback.
//! - **Error Handling** ([`error`]) - The crash/failure taxonomy.

pub mod accountant;
pub mod config;
pub mod error;
pub mod progress;
pub mod recovery;
pub mod sim;
pub mod stabilize;

#[cfg(test)]
pub(crate) mod testing;
