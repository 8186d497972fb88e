//! Centralized error handling for the catalog assistant.
//!
//! Every fallible step of the workflow maps onto one [`CatalogError`] kind, so
//! the caller can tell a dead database apart from a bad table name or a failed
//! model call:
//!
//! ```
//! use catalog_assistant::error::CatalogError;
//!
//! fn describe(err: &CatalogError) -> &'static str {
//!     match err {
//!         CatalogError::Connection(_) => "check the database settings",
//!         CatalogError::Query(_) => "check the schema and table name",
//!         CatalogError::Completion(_) => "try generating again",
//!         CatalogError::Execution(_) => "nothing was applied, fix and retry",
//!         _ => "see the log",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`CatalogError`]:
//!
//! ```no_run
//! use catalog_assistant::error::ResultExt as _;
//!
//! fn read_template(path: &str) -> catalog_assistant::error::Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read prompt template")
//! }
//! ```

use std::fmt;

/// Main error type for catalog assistant operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Database unreachable or authentication failure
    Connection(String),

    /// Catalog metadata query failed (e.g. unknown schema or table)
    Query(String),

    /// Language model call failed
    Completion(String),

    /// A `COMMENT ON` batch failed and was rolled back
    Execution(String),

    /// Invalid or incomplete configuration
    Config(String),

    /// Action not allowed at the current wizard step
    InvalidState(String),

    /// Column not present in the loaded working set
    UnknownColumn(String),

    /// I/O errors (export files, templates)
    Io(std::io::Error),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "Connection error: {msg}"),
            Self::Query(msg) => write!(f, "Query error: {msg}"),
            Self::Completion(msg) => write!(f, "Completion error: {msg}"),
            Self::Execution(msg) => write!(f, "Execution error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidState(msg) => write!(f, "Invalid step: {msg}"),
            Self::UnknownColumn(name) => write!(f, "Unknown column: {name}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result type alias for catalog assistant operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CatalogError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: CatalogError = e.into();
            CatalogError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: CatalogError = e.into();
            CatalogError::Other(format!("{}: {}", f(), err))
        })
    }
}
