//! # Core Module
//!
//! Provides the stateless building blocks of the recovery orchestrator.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Typed descriptions of simulation stages,
//!   serialized physical states, and per-retry bookkeeping records.
//! - **File I/O** ([`io`]) - The filesystem conventions shared with the
//!   external engine: recognized artifact extensions, quarantine naming,
//!   checkpoint discovery, and partial-output splicing.

pub mod io;
pub mod models;
