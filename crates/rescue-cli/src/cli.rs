use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "mdrescue CLI - supervised execution of molecular dynamics pipelines with automated crash recovery.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of worker threads for batch dispatch.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured simulation pipeline for a single input system.
    Run(RunArgs),
    /// Run several job configurations in parallel, one worker per system.
    Batch(BatchArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the job configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the maximum number of recovery attempts per stage.
    /// 0 disables crash recovery entirely.
    #[arg(long, value_name = "INT")]
    pub max_retries: Option<u32>,

    /// Override the job's output directory.
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Job configuration files, one per input system.
    #[arg(required = true, value_name = "PATHS", num_args(1..))]
    pub configs: Vec<PathBuf>,

    /// Override the maximum number of recovery attempts per stage for
    /// every job in the batch.
    #[arg(long, value_name = "INT")]
    pub max_retries: Option<u32>,
}
