//! Typed data models for simulation stages and recovery bookkeeping.

pub mod attempt;
pub mod spec;
pub mod state;
