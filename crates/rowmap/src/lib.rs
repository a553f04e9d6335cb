//! Map rows of delimited text into caller-defined records.
//!
//! Instead of binding fields by reflection, each column name is paired with a
//! parser function that writes the raw field text into the record being
//! built. Type coercion, validation and side effects all live in those
//! parsers, so the mapping is explicit and testable.
//!
//! # Features
//!
//! - **Header resolution**: headers are configured up front or read from the
//!   first row, and every header must have a parser
//! - **Error policy**: skip rows that fail to map, or terminate the parse
//! - **Hooks**: before/after the parse, after each record, and on every row error
//! - **Row sources**: `csv`-backed input from bytes, readers or files
//!
//! # Example
//!
//! ```
//! use rowmap::{MapperConfig, RecordMapper};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Person {
//!     id: u32,
//!     name: String,
//! }
//!
//! let config = MapperConfig::<Person, std::num::ParseIntError>::new()
//!     .with_column("id", |raw, person| {
//!         person.id = raw.parse()?;
//!         Ok(())
//!     })
//!     .with_column("name", |raw, person| {
//!         person.name = raw.to_string();
//!         Ok(())
//!     });
//!
//! let people = RecordMapper::from_bytes(config, "id,name\n1,Alice\nx,Bob\n")
//!     .parse()
//!     .unwrap();
//!
//! assert_eq!(people, vec![Person { id: 1, name: "Alice".to_string() }]);
//! ```

#![deny(unsafe_code)]

mod config;
mod display;
mod engine;
mod error;
mod registry;
mod source;

// === Configuration ===
pub use config::{ErrorObserver, ErrorPolicy, MapperConfig, ParseHook, RowHook};
pub use registry::{ColumnParser, ParserRegistry};

// === Engine ===
pub use engine::{ParseReport, RecordMapper};

// === Errors ===
pub use error::{ErrorKind, MapError, RowError, SourceError};

// === Row Sources ===
pub use source::{CsvOptions, CsvRowSource, IterRowSource, RowSource};

// === Rendering ===
pub use display::{COLUMN_WIDTH, RecordTable, Tabulate, render_records};
