//! Row sources feeding the mapping engine.
//!
//! The engine never tokenizes text itself. It pulls one row at a time from a
//! [`RowSource`], which either yields the row's fields, reports end of input
//! with `Ok(None)`, or fails with a [`SourceError`].

use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, Trim};

use crate::error::SourceError;

/// A producer of rows of string fields.
pub trait RowSource {
    /// Read the next row. `Ok(None)` signals end of input.
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError>;
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        (**self).next_row()
    }
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        (**self).next_row()
    }
}

/// Reader options for delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
    /// Lines starting with this byte are ignored.
    pub comment: Option<u8>,
    /// Trim surrounding whitespace from every field.
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            comment: None,
            trim: false,
        }
    }
}

impl CsvOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }

    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    fn builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        // Headers are resolved by the engine, and field-count mismatches are
        // reported per row rather than by the reader.
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .comment(self.comment)
            .trim(if self.trim { Trim::All } else { Trim::None });
        builder
    }
}

/// Row source backed by the `csv` crate.
pub struct CsvRowSource<R> {
    reader: csv::Reader<R>,
    record: ByteRecord,
}

impl<R: io::Read> CsvRowSource<R> {
    /// Read rows from any byte stream with default options.
    pub fn from_reader(reader: R) -> Self {
        Self::with_options(reader, CsvOptions::default())
    }

    /// Read rows from any byte stream.
    pub fn with_options(reader: R, options: CsvOptions) -> Self {
        Self {
            reader: options.builder().from_reader(reader),
            record: ByteRecord::new(),
        }
    }
}

impl CsvRowSource<Cursor<Vec<u8>>> {
    /// Read rows from an in-memory buffer.
    pub fn from_bytes(input: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(Cursor::new(input.into()))
    }
}

impl CsvRowSource<File> {
    /// Open a file and read rows from it.
    pub fn from_path(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::with_options(file, options))
    }
}

impl<R: io::Read> RowSource for CsvRowSource<R> {
    /// Records are decoded field by field, so a record with bad UTF-8 fails
    /// alone with [`SourceError::Decode`] and the next call reads on.
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        if !self.reader.read_byte_record(&mut self.record)? {
            return Ok(None);
        }
        let mut row = Vec::with_capacity(self.record.len());
        let mut invalid = None;
        for (index, field) in self.record.iter().enumerate() {
            match std::str::from_utf8(field) {
                Ok(text) => row.push(text.to_string()),
                Err(_) => {
                    invalid.get_or_insert(index + 1);
                    row.push(String::from_utf8_lossy(field).into_owned());
                }
            }
        }
        match invalid {
            Some(position) => Err(SourceError::Decode { position, row }),
            None => Ok(Some(row)),
        }
    }
}

/// Row source over an iterator of rows, including injected failures.
pub struct IterRowSource<I> {
    rows: I,
}

impl<I> IterRowSource<I>
where
    I: Iterator<Item = Result<Vec<String>, SourceError>>,
{
    pub fn new(rows: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl IterRowSource<std::vec::IntoIter<Result<Vec<String>, SourceError>>> {
    /// Build a source from in-memory rows.
    pub fn from_rows<Row, Field>(rows: impl IntoIterator<Item = Row>) -> Self
    where
        Row: IntoIterator<Item = Field>,
        Field: Into<String>,
    {
        let rows: Vec<_> = rows
            .into_iter()
            .map(|row| Ok(row.into_iter().map(Into::into).collect()))
            .collect();
        Self::new(rows)
    }
}

impl<I> RowSource for IterRowSource<I>
where
    I: Iterator<Item = Result<Vec<String>, SourceError>>,
{
    fn next_row(&mut self) -> Result<Option<Vec<String>>, SourceError> {
        self.rows.next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut impl RowSource) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        while let Some(row) = source.next_row().unwrap() {
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_csv_source_reads_every_row() {
        let mut source = CsvRowSource::from_bytes("id,name\n1,Alice\n2,\"Smith, Bob\"\n");
        let rows = drain(&mut source);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["id", "name"]);
        assert_eq!(rows[2], vec!["2", "Smith, Bob"]);
    }

    #[test]
    fn test_csv_source_end_of_input_is_repeatable() {
        let mut source = CsvRowSource::from_bytes("a\n");
        assert!(source.next_row().unwrap().is_some());
        assert!(source.next_row().unwrap().is_none());
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_csv_source_allows_ragged_rows() {
        let mut source = CsvRowSource::from_bytes("a,b\n1\n1,2,3\n");
        let rows = drain(&mut source);
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[2].len(), 3);
    }

    #[test]
    fn test_csv_source_options() {
        let options = CsvOptions::default()
            .with_delimiter(b';')
            .with_comment(Some(b'#'))
            .with_trim(true);
        let input = "# generated\nid; name\n1;  Alice \n";
        let mut source = CsvRowSource::with_options(input.as_bytes(), options);
        let rows = drain(&mut source);
        assert_eq!(rows, vec![vec!["id", "name"], vec!["1", "Alice"]]);
    }

    #[test]
    fn test_csv_source_empty_input() {
        let mut source = CsvRowSource::from_bytes(Vec::new());
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_csv_source_recovers_after_bad_utf8() {
        let mut source = CsvRowSource::from_bytes(b"1,ok\n2,\xff\n3,fine\n".to_vec());
        assert_eq!(source.next_row().unwrap(), Some(vec!["1".to_string(), "ok".to_string()]));

        let err = source.next_row().unwrap_err();
        assert!(err.is_row_level());
        assert!(matches!(&err, SourceError::Decode { position: 2, .. }));
        assert_eq!(err.row().to_vec(), vec!["2", "\u{FFFD}"]);

        assert_eq!(
            source.next_row().unwrap(),
            Some(vec!["3".to_string(), "fine".to_string()])
        );
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_iter_source_reports_failures() {
        let mut source = IterRowSource::new(vec![
            Ok(vec!["1".to_string()]),
            Err(SourceError::message("broken pipe")),
        ]);
        assert!(source.next_row().unwrap().is_some());
        let err = source.next_row().unwrap_err();
        assert_eq!(err.to_string(), "broken pipe");
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_iter_source_from_rows() {
        let mut source = IterRowSource::from_rows([["1", "Alice"], ["2", "Bob"]]);
        let rows = drain(&mut source);
        assert_eq!(rows, vec![vec!["1", "Alice"], vec!["2", "Bob"]]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = CsvRowSource::from_path("/definitely/not/here.csv", CsvOptions::default());
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
