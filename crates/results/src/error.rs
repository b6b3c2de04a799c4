//! Error types for the results crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for result parsing and retrieval
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A dispatcher output could not be parsed
    #[error("Failed to parse job output: {message}")]
    #[diagnostic(
        code(ebitools::results::parse),
        help("The service may have changed its output format; inspect the raw output")
    )]
    Parse {
        /// What the parser could not make sense of
        message: String,
    },

    /// Writing a result to disk failed
    #[error("I/O {operation} failed: {path}", path = .path.display())]
    #[diagnostic(code(ebitools::results::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path the operation touched
        path: Box<Path>,
        /// The attempted operation
        operation: &'static str,
    },

    /// Error from the underlying dispatcher client
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ebitools_client::Error),

    /// Error from the cache layer
    #[error(transparent)]
    #[diagnostic(transparent)]
    Cache(#[from] ebitools_cache::Error),
}

impl Error {
    /// Create a parse error
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: &'static str) -> Self {
        Self::Io {
            source,
            path: path.as_ref().into(),
            operation,
        }
    }
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;
