//! Column name to parser lookup.

use std::collections::HashMap;
use std::fmt;

/// A column parser: writes one field's text into the record being built.
pub type ColumnParser<R, E> = Box<dyn Fn(&str, &mut R) -> Result<(), E> + Send + Sync>;

/// Owned registry of column parsers, keyed by header name.
pub struct ParserRegistry<R, E> {
    parsers: HashMap<String, ColumnParser<R, E>>,
}

impl<R, E> ParserRegistry<R, E> {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser for `column`, replacing any previous one.
    pub fn register<F>(&mut self, column: impl Into<String>, parser: F)
    where
        F: Fn(&str, &mut R) -> Result<(), E> + Send + Sync + 'static,
    {
        self.parsers.insert(column.into(), Box::new(parser));
    }

    pub fn get(&self, column: &str) -> Option<&ColumnParser<R, E>> {
        self.parsers.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.parsers.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Registered column names, sorted.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        columns.sort_unstable();
        columns
    }
}

impl<R, E> Default for ParserRegistry<R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> fmt::Debug for ParserRegistry<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("columns", &self.columns())
            .finish()
    }
}
