//! Configuration types for the dispatcher client

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a dispatcher client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the job dispatcher REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact e-mail sent with every submission; the dispatcher requires one
    pub email: String,

    /// Cache directory override; resolved via the platform default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Polling behaviour
    #[serde(default)]
    pub poll: PollConfig,

    /// Log every status check at info level instead of debug
    #[serde(default = "default_true")]
    pub verbose: bool,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the e-mail
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            email: email.into(),
            cache_dir: None,
            poll: PollConfig::default(),
            verbose: default_true(),
        }
    }

    /// Override the dispatcher base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Override the polling behaviour
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Set whether status checks are logged at info level
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve the cache root: the explicit override when set, otherwise the
    /// platform default (environment override, XDG, OS cache dir, home)
    pub fn resolve_cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(ebitools_cache::default_cache_root()?),
        }
    }
}

/// Polling configuration
///
/// The wait between status checks starts at one second and grows by one
/// second after every check until it reaches `backoff_limit`. Polling stops
/// with an error once `attempts_threshold` checks have been made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status checks before giving up
    #[serde(default = "default_attempts_threshold")]
    pub attempts_threshold: u32,

    /// Upper bound on the wait between checks, in seconds
    #[serde(default = "default_backoff_limit")]
    pub backoff_limit: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts_threshold: default_attempts_threshold(),
            backoff_limit: default_backoff_limit(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://www.ebi.ac.uk/Tools/services/rest".to_string()
}

fn default_true() -> bool {
    true
}

fn default_attempts_threshold() -> u32 {
    100
}

fn default_backoff_limit() -> u64 {
    5
}
