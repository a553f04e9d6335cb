//! `rowmap` command-line entry point.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use rowmap::{CsvOptions, ErrorPolicy};
use rowmap_cli::commands::{Input, ParseRequest, ascii_byte, run_parse};
use rowmap_cli::logging::{LogConfig, LogFormat, init_logging};
use rowmap_cli::output::{OutputFormat, format_records, summary_table};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, OutputFormatArg, ParseArgs};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Parse(args) => match run(args) {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

fn run(args: &ParseArgs) -> Result<()> {
    let mut csv = CsvOptions::default()
        .with_delimiter(ascii_byte("--delimiter", args.delimiter)?)
        .with_trim(args.trim);
    if let Some(comment) = args.comment {
        csv = csv.with_comment(Some(ascii_byte("--comment", comment)?));
    }
    let request = ParseRequest {
        input: Input::from_arg(&args.input),
        columns: args.columns.clone(),
        headers: args.headers.clone(),
        error_policy: if args.terminate_on_error {
            ErrorPolicy::Terminate
        } else {
            ErrorPolicy::Skip
        },
        csv,
    };
    let outcome = run_parse(&request)?;

    let format = match args.format {
        OutputFormatArg::Table => OutputFormat::Table,
        OutputFormatArg::Boxed => OutputFormat::Boxed,
        OutputFormatArg::Json => OutputFormat::Json,
    };
    println!("{}", format_records(&outcome, format)?);
    if !args.no_summary {
        println!("{}", summary_table(&outcome.report));
    }
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        log_data: cli.log_data,
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
