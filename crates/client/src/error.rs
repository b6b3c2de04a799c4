//! Error types for the client crate

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for dispatcher client operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The dispatcher rejected a job submission
    #[error("Job submission rejected (HTTP {status}): {body}")]
    #[diagnostic(
        code(ebitools::client::submission),
        help("The response body usually names the offending parameter")
    )]
    Submission {
        /// HTTP status code of the rejection
        status: u16,
        /// Response body returned by the dispatcher
        body: String,
    },

    /// The dispatcher reported a status the client does not accept
    #[error("Job {job_id} reported unexpected status {status}")]
    #[diagnostic(
        code(ebitools::client::unexpected_status),
        help("The job may have failed or expired on the server; check the job id in the dispatcher's web interface")
    )]
    UnexpectedStatus {
        /// The job identifier
        job_id: String,
        /// The raw status token
        status: String,
    },

    /// The job did not finish within the polling attempt budget
    #[error("Job {job_id} not finished after {attempts} status checks")]
    #[diagnostic(
        code(ebitools::client::poll_timeout),
        help("Raise attempts_threshold or backoff_limit in the polling configuration")
    )]
    PollTimeout {
        /// The job identifier
        job_id: String,
        /// Number of status checks performed
        attempts: u32,
    },

    /// A cached-only request found no entry
    #[error("No cached {scope} entry at {path}", path = .path.display())]
    #[diagnostic(
        code(ebitools::client::cache_miss),
        help("Re-run without cached_only to submit the job")
    )]
    CacheMiss {
        /// Service scope of the request
        scope: String,
        /// Path the entry would occupy
        path: PathBuf,
    },

    /// A request was rejected before reaching the network
    #[error("Invalid request: {message}")]
    #[diagnostic(code(ebitools::client::invalid_input))]
    InvalidInput {
        /// What was wrong with the request
        message: String,
    },

    /// A response arrived but did not make sense
    #[error("Unexpected dispatcher response: {message}")]
    #[diagnostic(code(ebitools::client::protocol))]
    Protocol {
        /// What was wrong with the response
        message: String,
    },

    /// The dispatcher returned a failure status for a non-submission request
    #[error("Server returned HTTP {status} during {operation}: {body}")]
    #[diagnostic(code(ebitools::client::server))]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, if it could be read
        body: String,
        /// Operation that failed (e.g., "status", "result")
        operation: String,
    },

    /// HTTP transport failure
    #[error("HTTP {operation} failed")]
    #[diagnostic(
        code(ebitools::client::http),
        help("Check network connectivity and the configured base URL")
    )]
    Http {
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
        /// Operation that failed (e.g., "submit", "status", "result")
        operation: String,
    },

    /// Cache layer failure
    #[error(transparent)]
    #[diagnostic(transparent)]
    Cache(#[from] ebitools_cache::Error),
}

impl Error {
    /// Create a submission error
    #[must_use]
    pub fn submission(status: u16, body: impl Into<String>) -> Self {
        Self::Submission {
            status,
            body: body.into(),
        }
    }

    /// Create an unexpected status error
    #[must_use]
    pub fn unexpected_status(job_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            job_id: job_id.into(),
            status: status.into(),
        }
    }

    /// Create a poll timeout error
    #[must_use]
    pub fn poll_timeout(job_id: impl Into<String>, attempts: u32) -> Self {
        Self::PollTimeout {
            job_id: job_id.into(),
            attempts,
        }
    }

    /// Create a cache miss error
    #[must_use]
    pub fn cache_miss(scope: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::CacheMiss {
            scope: scope.into(),
            path: path.into(),
        }
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol {
            message: msg.into(),
        }
    }

    /// Create a server error
    #[must_use]
    pub fn server(status: u16, body: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
            operation: operation.into(),
        }
    }

    /// Create an HTTP transport error
    #[must_use]
    pub fn http(source: reqwest::Error, operation: impl Into<String>) -> Self {
        Self::Http {
            source,
            operation: operation.into(),
        }
    }
}

/// Result type for dispatcher client operations
pub type Result<T> = std::result::Result<T, Error>;
