//! Command implementations.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use rowmap::{CsvOptions, CsvRowSource, ErrorPolicy, ParseReport, RecordMapper, RowSource};
use tracing::{debug, info, warn};

use crate::logging::{redact_error, redact_row};
use crate::schema::{ColumnKind, ColumnSpec, DynamicRecord, build_config};

/// Where the delimited text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// `-` means stdin.
    pub fn from_arg(path: &Path) -> Self {
        if path == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Stdin => "<stdin>".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Everything needed to run one parse.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub input: Input,
    pub columns: Vec<ColumnSpec>,
    pub headers: Option<Vec<String>>,
    pub error_policy: ErrorPolicy,
    pub csv: CsvOptions,
}

/// Result of a parse, ready for printing.
#[derive(Debug)]
pub struct ParseOutcome {
    /// Names of the stored columns, in declaration order.
    pub columns: Vec<(String, ColumnKind)>,
    pub report: ParseReport<DynamicRecord>,
}

/// Convert a delimiter-like character flag into a byte.
pub fn ascii_byte(flag: &str, value: char) -> Result<u8> {
    ensure!(value.is_ascii(), "{flag} must be a single ASCII character, got '{value}'");
    Ok(value as u8)
}

/// Run a parse against the request's input.
pub fn run_parse(request: &ParseRequest) -> Result<ParseOutcome> {
    let source: Box<dyn RowSource> = match &request.input {
        Input::Stdin => Box::new(CsvRowSource::with_options(io::stdin().lock(), request.csv)),
        Input::File(path) => Box::new(
            CsvRowSource::from_path(path, request.csv)
                .with_context(|| format!("open {}", path.display()))?,
        ),
    };
    parse_source(request, source)
}

/// Run a parse against an arbitrary byte stream.
pub fn parse_reader<R: Read>(request: &ParseRequest, reader: R) -> Result<ParseOutcome> {
    parse_source(request, CsvRowSource::with_options(reader, request.csv))
}

fn parse_source<S: RowSource>(request: &ParseRequest, source: S) -> Result<ParseOutcome> {
    let name = request.input.describe();
    let _span = tracing::info_span!("parse", input = %name).entered();

    let mut config = build_config(&request.columns)
        .with_error_policy(request.error_policy)
        .on_error(|fields, err| {
            warn!(
                row = %redact_row(fields),
                column = err.column(),
                reason = err.reason(),
                error = %redact_error(err),
                "row rejected"
            );
        });
    if let Some(headers) = &request.headers {
        config = config.with_headers(headers.iter().cloned());
    }
    debug!(
        columns = request.columns.len(),
        policy = ?request.error_policy,
        "mapper configured"
    );

    let report = RecordMapper::new(config, source)
        .parse_with_report()
        .with_context(|| format!("parse {name}"))?;
    info!(
        records = report.rows_parsed(),
        skipped = report.rows_skipped,
        "parsed {name}"
    );

    let columns = request
        .columns
        .iter()
        .filter(|spec| spec.kind != ColumnKind::Skip)
        .map(|spec| (spec.name.clone(), spec.kind))
        .collect();
    Ok(ParseOutcome { columns, report })
}
