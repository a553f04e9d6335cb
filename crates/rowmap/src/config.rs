//! Mapper configuration.
//!
//! A [`MapperConfig`] is an owned value assembled up front and handed to
//! [`RecordMapper`](crate::RecordMapper). It cannot be changed once a parse
//! has started, since the mapper takes it by value.

use std::fmt;

use crate::error::RowError;
use crate::registry::ParserRegistry;

/// Callback observing every row-level failure.
pub type ErrorObserver<E> = Box<dyn FnMut(&[String], &RowError<E>) + Send>;

/// Callback run once before or after a parse.
pub type ParseHook = Box<dyn FnMut() + Send>;

/// Callback receiving each completed record.
pub type RowHook<R> = Box<dyn FnMut(R) + Send>;

/// What to do when a row fails to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Drop the failing row and keep going.
    #[default]
    Skip,
    /// Abort the parse and discard every record collected so far.
    Terminate,
}

/// Configuration for a [`RecordMapper`](crate::RecordMapper).
pub struct MapperConfig<R, E> {
    pub(crate) headers: Option<Vec<String>>,
    pub(crate) parsers: ParserRegistry<R, E>,
    pub(crate) error_policy: ErrorPolicy,
    pub(crate) on_error: Option<ErrorObserver<E>>,
    pub(crate) before_parse: Option<ParseHook>,
    pub(crate) after_parse: Option<ParseHook>,
    pub(crate) after_each_row: Option<RowHook<R>>,
}

impl<R, E> Default for MapperConfig<R, E> {
    fn default() -> Self {
        Self {
            headers: None,
            parsers: ParserRegistry::new(),
            error_policy: ErrorPolicy::default(),
            on_error: None,
            before_parse: None,
            after_parse: None,
            after_each_row: None,
        }
    }
}

impl<R, E> MapperConfig<R, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the headers up front. The first row of input is then data.
    ///
    /// An empty list is the same as not supplying headers: they will be read
    /// from the first row.
    #[must_use]
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        self.headers = (!headers.is_empty()).then_some(headers);
        self
    }

    /// Register the parser for a column, replacing any earlier registration.
    #[must_use]
    pub fn with_column<F>(mut self, column: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&str, &mut R) -> Result<(), E> + Send + Sync + 'static,
    {
        self.parsers.register(column, parser);
        self
    }

    /// Replace the whole parser registry.
    #[must_use]
    pub fn with_parsers(mut self, parsers: ParserRegistry<R, E>) -> Self {
        self.parsers = parsers;
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Abort on the first row that fails to map.
    #[must_use]
    pub fn terminate_on_error(self) -> Self {
        self.with_error_policy(ErrorPolicy::Terminate)
    }

    /// Observe row failures. Runs before the error policy is applied.
    #[must_use]
    pub fn on_error<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&[String], &RowError<E>) + Send + 'static,
    {
        self.on_error = Some(Box::new(observer));
        self
    }

    #[must_use]
    pub fn before_parse<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.before_parse = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn after_parse<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.after_parse = Some(Box::new(hook));
        self
    }

    /// Receive a copy of every record once it has been collected.
    #[must_use]
    pub fn after_each_row<F>(mut self, hook: F) -> Self
    where
        F: FnMut(R) + Send + 'static,
    {
        self.after_each_row = Some(Box::new(hook));
        self
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    pub fn parsers(&self) -> &ParserRegistry<R, E> {
        &self.parsers
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }
}

impl<R, E> fmt::Debug for MapperConfig<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("headers", &self.headers)
            .field("parsers", &self.parsers)
            .field("error_policy", &self.error_policy)
            .field("on_error", &self.on_error.is_some())
            .field("before_parse", &self.before_parse.is_some())
            .field("after_parse", &self.after_parse.is_some())
            .field("after_each_row", &self.after_each_row.is_some())
            .finish()
    }
}
