//! Error type for the facade crate

use miette::Diagnostic;
use thiserror::Error;

/// Error type covering query validation and every layer below
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A query failed validation before submission
    #[error("Invalid query: {message}")]
    #[diagnostic(
        code(ebitools::invalid_query),
        help("Fix the query locally; nothing was submitted to the service")
    )]
    InvalidQuery {
        /// What the query is missing
        message: String,
    },

    /// Error from the dispatcher client
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ebitools_client::Error),

    /// Error from result parsing or retrieval
    #[error(transparent)]
    #[diagnostic(transparent)]
    Results(#[from] ebitools_results::Error),
}

impl Error {
    /// Create a query validation error
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;
