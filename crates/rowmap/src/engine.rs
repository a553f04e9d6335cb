//! The mapping engine.
//!
//! A [`RecordMapper`] owns its configuration and its row source. A parse runs
//! in three steps:
//!
//! 1. **Headers**: use the configured headers, or read them from the first
//!    row. Every header must have a registered parser.
//! 2. **Rows**: pull rows until end of input, mapping each into a fresh
//!    `R::default()` by running the column parsers in header order.
//! 3. **Policy**: a failed row is reported to the error observer, then either
//!    skipped or, under [`ErrorPolicy::Terminate`], ends the parse with no
//!    records.
//!
//! The before-parse hook runs once at the start of every parse and the
//! after-parse hook once at the end, whatever the outcome.

use std::fmt;
use std::io::{self, Cursor};

use tracing::{debug, info, trace, warn};

use crate::config::{ErrorPolicy, MapperConfig};
use crate::error::{MapError, RowError, SourceError};
use crate::source::{CsvRowSource, RowSource};

/// Records produced by a parse, with row accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport<R> {
    /// Mapped records in input order.
    pub records: Vec<R>,
    /// Headers the rows were mapped against.
    pub headers: Vec<String>,
    /// Data rows read from the source (header row excluded).
    pub rows_read: u64,
    /// Rows dropped under [`ErrorPolicy::Skip`].
    pub rows_skipped: u64,
}

impl<R> ParseReport<R> {
    pub fn rows_parsed(&self) -> usize {
        self.records.len()
    }
}

/// Maps rows from a [`RowSource`] into records of type `R`.
pub struct RecordMapper<R, E, S> {
    config: MapperConfig<R, E>,
    source: S,
    headers: Option<Vec<String>>,
    header_failure: Option<HeaderFailure>,
}

/// A failed header resolution, replayed on later calls because the header
/// row has already been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderFailure {
    Unparsable(String),
    Missing,
    Unreadable(String),
}

impl HeaderFailure {
    fn record<E>(err: &MapError<E>) -> Option<Self> {
        match err {
            MapError::UnparsableHeader { header } => Some(Self::Unparsable(header.clone())),
            MapError::MissingHeaderRow => Some(Self::Missing),
            MapError::HeaderRead { source } => Some(Self::Unreadable(source.to_string())),
            MapError::Parse { .. } | MapError::Read { .. } => None,
        }
    }

    fn replay<E>(&self) -> MapError<E> {
        match self {
            Self::Unparsable(header) => MapError::UnparsableHeader {
                header: header.clone(),
            },
            Self::Missing => MapError::MissingHeaderRow,
            Self::Unreadable(message) => MapError::HeaderRead {
                source: SourceError::message(message.clone()),
            },
        }
    }
}

impl<R, E, S> RecordMapper<R, E, S> {
    pub fn new(config: MapperConfig<R, E>, source: S) -> Self {
        Self {
            config,
            source,
            headers: None,
            header_failure: None,
        }
    }

    pub fn config(&self) -> &MapperConfig<R, E> {
        &self.config
    }

    /// Resolved headers, or `None` before [`resolve_headers`](Self::resolve_headers)
    /// has succeeded.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }
}

impl<R, E> RecordMapper<R, E, CsvRowSource<Cursor<Vec<u8>>>> {
    /// Map delimited text held in memory.
    pub fn from_bytes(config: MapperConfig<R, E>, input: impl Into<Vec<u8>>) -> Self {
        Self::new(config, CsvRowSource::from_bytes(input))
    }
}

impl<R, E, Rd: io::Read> RecordMapper<R, E, CsvRowSource<Rd>> {
    /// Map delimited text from a byte stream.
    pub fn from_reader(config: MapperConfig<R, E>, reader: Rd) -> Self {
        Self::new(config, CsvRowSource::from_reader(reader))
    }
}

impl<R, E, S> RecordMapper<R, E, S>
where
    R: Default + Clone,
    E: fmt::Display,
    S: RowSource,
{
    /// Resolve the header set and check that every header has a parser.
    ///
    /// With configured headers no row is read. Otherwise the first row is
    /// consumed and each token is trimmed of surrounding spaces. The first
    /// header without a parser fails resolution, and nothing is kept.
    /// Later calls return the same headers, or the same error, without
    /// reading again.
    pub fn resolve_headers(&mut self) -> Result<&[String], MapError<E>> {
        self.ensure_headers()?;
        Ok(self.headers.as_deref().unwrap_or(&[]))
    }

    fn ensure_headers(&mut self) -> Result<(), MapError<E>> {
        if self.headers.is_some() {
            return Ok(());
        }
        if let Some(failure) = &self.header_failure {
            return Err(failure.replay());
        }
        match self.lookup_headers() {
            Ok(headers) => {
                debug!(columns = headers.len(), headers = ?headers, "resolved headers");
                self.headers = Some(headers);
                Ok(())
            }
            Err(err) => {
                self.header_failure = HeaderFailure::record(&err);
                Err(err)
            }
        }
    }

    fn lookup_headers(&mut self) -> Result<Vec<String>, MapError<E>> {
        match &self.config.headers {
            Some(configured) => {
                if let Some(header) = configured
                    .iter()
                    .find(|header| !self.config.parsers.contains(header))
                {
                    return Err(MapError::UnparsableHeader {
                        header: header.clone(),
                    });
                }
                Ok(configured.clone())
            }
            None => self.read_headers(),
        }
    }

    fn read_headers(&mut self) -> Result<Vec<String>, MapError<E>> {
        let row = match self.source.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => return Err(MapError::MissingHeaderRow),
            Err(source) => return Err(MapError::HeaderRead { source }),
        };
        let mut headers = Vec::with_capacity(row.len());
        for token in row {
            let header = token.trim_matches(' ');
            if !self.config.parsers.contains(header) {
                return Err(MapError::UnparsableHeader {
                    header: header.to_string(),
                });
            }
            headers.push(header.to_string());
        }
        Ok(headers)
    }

    /// Headers used by [`parse_row`](Self::parse_row): the resolved set, or
    /// the configured set before resolution.
    fn active_headers(&self) -> &[String] {
        self.headers
            .as_deref()
            .or(self.config.headers.as_deref())
            .unwrap_or(&[])
    }

    /// Map one row into a new record.
    ///
    /// Parsers run in header order and the first failure ends the row. A
    /// parser's own error is returned as-is inside [`RowError::Column`].
    pub fn parse_row(&self, row: &[String]) -> Result<R, RowError<E>> {
        let headers = self.active_headers();
        if row.len() != headers.len() {
            return Err(RowError::FieldCount {
                expected: headers.len(),
                found: row.len(),
            });
        }
        let mut record = R::default();
        for (header, value) in headers.iter().zip(row) {
            let Some(parser) = self.config.parsers.get(header) else {
                return Err(RowError::UnparsableHeader {
                    header: header.clone(),
                });
            };
            parser(value.as_str(), &mut record).map_err(|source| RowError::Column {
                column: header.clone(),
                source,
            })?;
        }
        Ok(record)
    }

    /// Parse the whole input into records.
    pub fn parse(self) -> Result<Vec<R>, MapError<E>> {
        self.parse_with_report().map(|report| report.records)
    }

    /// Parse the whole input, also returning headers and row counts.
    pub fn parse_with_report(mut self) -> Result<ParseReport<R>, MapError<E>> {
        if let Some(hook) = self.config.before_parse.as_mut() {
            hook();
        }
        let result = match self.ensure_headers() {
            Ok(()) => self.collect_rows(),
            Err(err) => {
                warn!(error = %err, "header resolution failed");
                Err(err)
            }
        };
        if let Some(hook) = self.config.after_parse.as_mut() {
            hook();
        }
        result
    }

    fn collect_rows(&mut self) -> Result<ParseReport<R>, MapError<E>> {
        let mut records = Vec::new();
        let mut rows_read = 0u64;
        let mut rows_skipped = 0u64;

        loop {
            let (row, result) = match self.source.next_row() {
                Ok(Some(row)) => {
                    rows_read += 1;
                    let result = self.parse_row(&row);
                    (row, result)
                }
                Ok(None) => break,
                Err(source) if source.is_row_level() => {
                    rows_read += 1;
                    (source.row().to_vec(), Err(RowError::Decode { source }))
                }
                Err(source) => {
                    warn!(row = rows_read + 1, error = %source, "row source failed");
                    return Err(MapError::Read {
                        row: rows_read + 1,
                        source,
                    });
                }
            };

            match result {
                Ok(record) => {
                    trace!(row = rows_read, "mapped row");
                    match self.config.after_each_row.as_mut() {
                        Some(hook) => {
                            records.push(record.clone());
                            hook(record);
                        }
                        None => records.push(record),
                    }
                }
                Err(err) => {
                    if let Some(observer) = self.config.on_error.as_mut() {
                        observer(row.as_slice(), &err);
                    }
                    // Field values stay out of the log; the observer sees them.
                    match self.config.error_policy {
                        ErrorPolicy::Skip => {
                            debug!(
                                row = rows_read,
                                column = err.column(),
                                reason = err.reason(),
                                "skipping row"
                            );
                            rows_skipped += 1;
                        }
                        ErrorPolicy::Terminate => {
                            debug!(
                                row = rows_read,
                                column = err.column(),
                                reason = err.reason(),
                                discarded = records.len(),
                                "terminating parse"
                            );
                            return Err(MapError::Parse {
                                row: rows_read,
                                source: err,
                            });
                        }
                    }
                }
            }
        }

        info!(
            rows_read,
            rows_parsed = records.len(),
            rows_skipped,
            "parse complete"
        );
        Ok(ParseReport {
            records,
            headers: self.active_headers().to_vec(),
            rows_read,
            rows_skipped,
        })
    }
}

impl<R, E, S> fmt::Debug for RecordMapper<R, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMapper")
            .field("config", &self.config)
            .field("headers", &self.headers)
            .field("header_failure", &self.header_failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::IterRowSource;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Pair {
        left: String,
        right: String,
    }

    fn config() -> MapperConfig<Pair, String> {
        MapperConfig::new()
            .with_column("left", |raw, pair: &mut Pair| {
                pair.left = raw.to_string();
                Ok(())
            })
            .with_column("right", |raw, pair: &mut Pair| {
                if raw.is_empty() {
                    return Err("right is required".to_string());
                }
                pair.right = raw.to_string();
                Ok(())
            })
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| (*f).to_string()).collect()
    }

    #[test]
    fn test_headers_read_from_first_row_are_trimmed() {
        let source = IterRowSource::from_rows([[" left", "right  "]]);
        let mut mapper = RecordMapper::new(config(), source);
        assert!(mapper.headers().is_none());
        let headers = mapper.resolve_headers().unwrap().to_vec();
        assert_eq!(headers, vec!["left", "right"]);
        assert_eq!(mapper.headers(), Some(&headers[..]));
    }

    #[test]
    fn test_resolve_headers_is_idempotent() {
        let source = IterRowSource::from_rows([["left", "right"], ["a", "b"]]);
        let mut mapper = RecordMapper::new(config(), source);
        mapper.resolve_headers().unwrap();
        // A second call must not consume the first data row.
        mapper.resolve_headers().unwrap();
        assert_eq!(mapper.parse().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_header_resolution_is_not_retried() {
        let source = IterRowSource::from_rows([["left", "bogus"], ["left", "right"]]);
        let mut mapper = RecordMapper::new(config(), source);
        for _ in 0..2 {
            assert!(matches!(
                mapper.resolve_headers(),
                Err(MapError::UnparsableHeader { header }) if header == "bogus"
            ));
        }
        assert!(mapper.headers().is_none());
        // The parse fails the same way instead of treating row two as headers.
        assert!(matches!(
            mapper.parse(),
            Err(MapError::UnparsableHeader { header }) if header == "bogus"
        ));
    }

    #[test]
    fn test_unreadable_header_row_is_replayed() {
        let source = IterRowSource::new(vec![
            Err(SourceError::message("reset by peer")),
            Ok(vec!["left".to_string(), "right".to_string()]),
        ]);
        let mut mapper = RecordMapper::new(config(), source);
        let first = mapper.resolve_headers().unwrap_err().to_string();
        let second = mapper.resolve_headers().unwrap_err().to_string();
        assert_eq!(first, "could not read headers: reset by peer");
        assert_eq!(first, second);
    }

    #[test]
    fn test_undecodable_row_follows_policy() {
        let source = IterRowSource::new(vec![
            Ok(vec!["left".to_string(), "right".to_string()]),
            Err(SourceError::Decode {
                position: 1,
                row: vec!["\u{FFFD}".to_string(), "b".to_string()],
            }),
            Ok(vec!["c".to_string(), "d".to_string()]),
        ]);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);
        let config = config().on_error(move |row, err: &RowError<String>| {
            sink.lock().unwrap().push((row.to_vec(), err.reason()));
        });

        let report = RecordMapper::new(config, source).parse_with_report().unwrap();

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.records[0].left, "c");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(vec!["\u{FFFD}".to_string(), "b".to_string()], "decode")]
        );
    }

    #[test]
    fn test_configured_headers_do_not_read_input() {
        let source = IterRowSource::new(vec![Err(SourceError::message("unreadable"))]);
        let mut mapper = RecordMapper::new(config().with_headers(["right", "left"]), source);
        assert_eq!(
            mapper.resolve_headers().unwrap().to_vec(),
            vec!["right", "left"]
        );
    }

    #[test]
    fn test_parse_row_follows_header_order() {
        let source = IterRowSource::from_rows(Vec::<Vec<String>>::new());
        let mapper = RecordMapper::new(config().with_headers(["right", "left"]), source);
        let pair = mapper.parse_row(&row(&["r", "l"])).unwrap();
        assert_eq!(
            pair,
            Pair {
                left: "l".to_string(),
                right: "r".to_string()
            }
        );
    }

    #[test]
    fn test_parse_row_returns_parser_error_unchanged() {
        let source = IterRowSource::from_rows(Vec::<Vec<String>>::new());
        let mapper = RecordMapper::new(config().with_headers(["left", "right"]), source);
        let err = mapper.parse_row(&row(&["l", ""])).unwrap_err();
        assert_eq!(err.column(), Some("right"));
        assert_eq!(err.into_parser_error(), Some("right is required".to_string()));
    }

    #[test]
    fn test_parse_row_rejects_wrong_field_count() {
        let source = IterRowSource::from_rows(Vec::<Vec<String>>::new());
        let mapper = RecordMapper::new(config().with_headers(["left", "right"]), source);
        assert!(matches!(
            mapper.parse_row(&row(&["only"])),
            Err(RowError::FieldCount {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            mapper.parse_row(&row(&["a", "b", "c"])),
            Err(RowError::FieldCount {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_parse_row_without_parser_before_resolution() {
        let source = IterRowSource::from_rows(Vec::<Vec<String>>::new());
        let mapper = RecordMapper::new(config().with_headers(["left", "middle"]), source);
        assert!(matches!(
            mapper.parse_row(&row(&["a", "b"])),
            Err(RowError::UnparsableHeader { header }) if header == "middle"
        ));
    }

    #[test]
    fn test_report_counts_rows() {
        let source = IterRowSource::from_rows([["left", "right"], ["a", "b"], ["c", ""], ["e", "f"]]);
        let report = RecordMapper::new(config(), source)
            .parse_with_report()
            .unwrap();
        assert_eq!(report.headers, vec!["left", "right"]);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.rows_parsed(), 2);
    }

    #[test]
    fn test_debug_lists_state() {
        let source = IterRowSource::from_rows(Vec::<Vec<String>>::new());
        let mapper = RecordMapper::new(config(), source);
        let debug = format!("{mapper:?}");
        assert!(debug.starts_with("RecordMapper"));
        assert!(debug.contains("headers: None"));
    }
}
