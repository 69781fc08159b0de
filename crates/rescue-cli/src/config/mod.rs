//! Job configuration: the on-disk TOML schema and its conversion into
//! validated simulation stage specs.

pub mod file;
pub mod models;

pub use file::{AppConfig, load_job};
