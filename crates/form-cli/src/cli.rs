//! CLI argument definitions for formctl.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "formctl",
    version,
    about = "Form state engine tooling - replay edits, inspect step snapshots",
    long_about = "Drive the form state engine from the command line.\n\n\
                  Replays a script of form actions against a document, validates the\n\
                  result and stores it as a step snapshot, or inspects a saved snapshot."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -vvv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow field values in trace logs (they may hold personal data).
    #[arg(long = "log-values", global = true)]
    pub log_values: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay an action script against a document.
    Replay(ReplayArgs),

    /// Show the contents of a step snapshot.
    Inspect(InspectArgs),

    /// List the fields declared by a schema.
    Schema(SchemaArgs),
}

#[derive(Parser)]
pub struct ReplayArgs {
    /// Field declarations (JSON).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Persisted document to start from (JSON object).
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Actions to apply, in order (JSON array).
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Save the final state as a step snapshot.
    #[arg(long = "snapshot", value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Step name recorded in the snapshot.
    #[arg(long = "step", default_value = "replay")]
    pub step: String,

    /// Seed for row identities. Fixed seeds give replayable row ids; without
    /// one every run mints fresh ids.
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<String>,

    /// Validate only at the end instead of after every action.
    #[arg(long = "deferred")]
    pub deferred: bool,

    /// Submit at the end; exits non-zero if the form is not valid.
    #[arg(long = "submit")]
    pub submit: bool,

    /// Print the submitted data as JSON.
    #[arg(long = "print-data")]
    pub print_data: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Step snapshot to read.
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Rehydrate with this schema and report form validity.
    #[arg(long = "schema", value_name = "SCHEMA")]
    pub schema: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Field declarations (JSON).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
