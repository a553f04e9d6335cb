//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use rowmap_cli::schema::ColumnSpec;

#[derive(Parser)]
#[command(
    name = "rowmap",
    version,
    about = "Map delimited text into typed records",
    long_about = "Map delimited text into typed records.\n\n\
                  Every column is declared with --column NAME:KIND and parsed by its own\n\
                  coercion rule. Rows that fail are skipped unless --terminate-on-error is set."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for machine parsing).
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

    /// Include raw field values of rejected rows in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a delimited file into records.
    Parse(ParseArgs),
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Input file, or `-` for stdin.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Column declaration as NAME:KIND (string, int, float, bool, date, skip).
    #[arg(short = 'c', long = "column", value_name = "NAME:KIND", required = true)]
    pub columns: Vec<ColumnSpec>,

    /// Comma-separated headers when the input has no header row.
    #[arg(long = "headers", value_name = "NAMES", value_delimiter = ',')]
    pub headers: Option<Vec<String>>,

    /// Abort on the first row that fails instead of skipping it.
    #[arg(long = "terminate-on-error")]
    pub terminate_on_error: bool,

    /// Field delimiter.
    #[arg(short = 'd', long = "delimiter", default_value = ",")]
    pub delimiter: char,

    /// Ignore lines starting with this character.
    #[arg(long = "comment")]
    pub comment: Option<char>,

    /// Trim whitespace around every field.
    #[arg(long = "trim")]
    pub trim: bool,

    /// Output format for the parsed records.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Do not print the row summary.
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// Bordered table.
    Table,
    /// Fixed-width debug block.
    Boxed,
    /// JSON array.
    Json,
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
