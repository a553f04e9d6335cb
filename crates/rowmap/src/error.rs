//! Error types for row mapping.
//!
//! Three layers are kept apart:
//!
//! - [`SourceError`]: the row source failed to produce a row.
//! - [`RowError`]: a single row could not be mapped into a record.
//! - [`MapError`]: a whole parse was aborted.
//!
//! Parser errors are generic over the caller's own error type `E` and are
//! carried untouched, so callers can match on their own variants.

use thiserror::Error;

/// Failure of the underlying row source, distinct from end of input.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The delimited-text reader rejected the input.
    #[error("csv reader error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while opening or reading the input.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A record was read but one of its fields is not valid UTF-8.
    ///
    /// The reader has already moved past the record, so the next row can
    /// still be read. `row` holds the fields decoded lossily.
    #[error("field {position} is not valid UTF-8")]
    Decode { position: usize, row: Vec<String> },

    /// Failure reported by a custom row source.
    #[error("{message}")]
    Message { message: String },
}

impl SourceError {
    /// Build a [`SourceError::Message`] from anything printable.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// True when only the current record is bad and reading can go on.
    pub fn is_row_level(&self) -> bool {
        match self {
            Self::Decode { .. } => true,
            Self::Csv(err) => matches!(
                err.kind(),
                csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. }
            ),
            Self::Io(_) | Self::Message { .. } => false,
        }
    }

    /// Fields of the bad record, when the source could recover them.
    pub fn row(&self) -> &[String] {
        match self {
            Self::Decode { row, .. } => row,
            _ => &[],
        }
    }
}

/// Failure to map one row into a record.
#[derive(Debug, Error)]
pub enum RowError<E> {
    /// A column parser rejected its field.
    #[error("column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: E,
    },

    /// A header has no registered parser.
    #[error("unparsable header: {header}")]
    UnparsableHeader { header: String },

    /// The row does not have one field per header.
    #[error("row has {found} fields but {expected} headers were resolved")]
    FieldCount { expected: usize, found: usize },

    /// The source could not decode the row.
    #[error("undecodable row: {source}")]
    Decode {
        #[source]
        source: SourceError,
    },
}

impl<E> RowError<E> {
    /// The caller-defined parser error, if this row failed inside a parser.
    pub fn parser_error(&self) -> Option<&E> {
        match self {
            Self::Column { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Consume the row error and return the caller-defined parser error.
    pub fn into_parser_error(self) -> Option<E> {
        match self {
            Self::Column { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Name of the column that failed, when the failure is tied to one.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Column { column, .. } => Some(column),
            Self::UnparsableHeader { header } => Some(header),
            Self::FieldCount { .. } | Self::Decode { .. } => None,
        }
    }

    /// Short tag for the failure, free of field values.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Column { .. } => "parser",
            Self::UnparsableHeader { .. } => "unparsable-header",
            Self::FieldCount { .. } => "field-count",
            Self::Decode { .. } => "decode",
        }
    }
}

/// Error taxonomy for a failed parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required column has no registered parser.
    Header,
    /// The header row could not be read.
    HeaderRead,
    /// A row was rejected and the error policy terminated the parse.
    RowField,
    /// The row source failed while reading a data row.
    Reader,
}

/// Fatal failure of a parse.
#[derive(Debug, Error)]
pub enum MapError<E> {
    /// A header has no registered parser.
    #[error("unparsable header: {header}")]
    UnparsableHeader { header: String },

    /// Headers were expected in the first row but the input was empty.
    #[error("could not read headers: input is empty")]
    MissingHeaderRow,

    /// The row source failed while reading the header row.
    #[error("could not read headers: {source}")]
    HeaderRead {
        #[source]
        source: SourceError,
    },

    /// A row failed to map while terminating on errors.
    #[error("failed to parse row {row}: {source}")]
    Parse {
        row: u64,
        #[source]
        source: RowError<E>,
    },

    /// The row source failed while reading a data row.
    #[error("failed to read row {row}: {source}")]
    Read {
        row: u64,
        #[source]
        source: SourceError,
    },
}

impl<E> MapError<E> {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnparsableHeader { .. } => ErrorKind::Header,
            Self::MissingHeaderRow | Self::HeaderRead { .. } => ErrorKind::HeaderRead,
            Self::Parse { .. } => ErrorKind::RowField,
            Self::Read { .. } => ErrorKind::Reader,
        }
    }

    /// The row error behind a terminated parse.
    pub fn row_error(&self) -> Option<&RowError<E>> {
        match self {
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("not a number: {0}")]
    struct NotANumber(String);

    #[test]
    fn test_row_error_display_names_column() {
        let err = RowError::Column {
            column: "id".to_string(),
            source: NotANumber("x".to_string()),
        };
        assert_eq!(err.to_string(), "column 'id': not a number: x");
    }

    #[test]
    fn test_row_error_keeps_parser_error() {
        let err = RowError::Column {
            column: "id".to_string(),
            source: NotANumber("x".to_string()),
        };
        assert_eq!(err.column(), Some("id"));
        assert_eq!(err.parser_error(), Some(&NotANumber("x".to_string())));
        assert_eq!(
            err.into_parser_error(),
            Some(NotANumber("x".to_string()))
        );
    }

    #[test]
    fn test_field_count_has_no_parser_error() {
        let err: RowError<NotANumber> = RowError::FieldCount {
            expected: 2,
            found: 1,
        };
        assert!(err.parser_error().is_none());
        assert!(err.column().is_none());
        assert_eq!(
            err.to_string(),
            "row has 1 fields but 2 headers were resolved"
        );
    }

    #[test]
    fn test_map_error_kinds() {
        let header: MapError<NotANumber> = MapError::UnparsableHeader {
            header: "age".to_string(),
        };
        assert_eq!(header.kind(), ErrorKind::Header);
        assert_eq!(header.to_string(), "unparsable header: age");

        let empty: MapError<NotANumber> = MapError::MissingHeaderRow;
        assert_eq!(empty.kind(), ErrorKind::HeaderRead);

        let read: MapError<NotANumber> = MapError::Read {
            row: 3,
            source: SourceError::message("disk gone"),
        };
        assert_eq!(read.kind(), ErrorKind::Reader);
        assert_eq!(read.to_string(), "failed to read row 3: disk gone");

        let parse: MapError<NotANumber> = MapError::Parse {
            row: 2,
            source: RowError::Column {
                column: "id".to_string(),
                source: NotANumber("x".to_string()),
            },
        };
        assert_eq!(parse.kind(), ErrorKind::RowField);
        assert!(parse.row_error().is_some());
    }

    #[test]
    fn test_decode_error_is_row_level() {
        let err = SourceError::Decode {
            position: 2,
            row: vec!["2".to_string(), "\u{FFFD}".to_string()],
        };
        assert!(err.is_row_level());
        assert_eq!(err.row().len(), 2);
        assert_eq!(err.to_string(), "field 2 is not valid UTF-8");
        assert!(!SourceError::message("gone").is_row_level());
        assert!(SourceError::message("gone").row().is_empty());

        let row: RowError<NotANumber> = RowError::Decode { source: err };
        assert_eq!(row.reason(), "decode");
        assert!(row.column().is_none());
    }

    #[test]
    fn test_reason_tags_omit_values() {
        let err = RowError::Column {
            column: "id".to_string(),
            source: NotANumber("secret".to_string()),
        };
        assert_eq!(err.reason(), "parser");
        assert!(!err.reason().contains("secret"));
    }

    #[test]
    fn test_source_error_from_io() {
        let io = std::io::Error::other("boom");
        let err: SourceError = io.into();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
