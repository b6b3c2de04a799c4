//! Query builders for the analysis services
//!
//! A query carries only the caller's choices; the service-specific
//! parameters the dispatcher requires (`program`, `task`, `stype`) are
//! pinned when the query is turned into request parameters, and the
//! contact e-mail comes from the client configuration.

use crate::error::{Error, Result};
use ebitools_cache::RequestParams;
use ebitools_client::FetchOptions;

/// A protein BLAST search against a UniProt database
#[derive(Debug, Clone)]
pub struct BlastpQuery {
    sequence: String,
    exp: String,
    database: String,
    fetch: FetchOptions,
}

impl BlastpQuery {
    /// Search with the given protein sequence and default settings
    #[must_use]
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            exp: "1e-10".to_string(),
            database: "uniprotkb".to_string(),
            fetch: FetchOptions::default(),
        }
    }

    /// Set the expectation value threshold (the `exp` parameter)
    #[must_use]
    pub fn with_expectation(mut self, exp: impl Into<String>) -> Self {
        self.exp = exp.into();
        self
    }

    /// Search a different UniProt database
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Apply cache interaction flags to the run and every result fetch
    #[must_use]
    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// The cache interaction flags this query carries
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        self.fetch
    }

    pub(crate) fn params(&self, email: &str) -> Result<RequestParams> {
        let sequence = self.sequence.trim();
        if sequence.is_empty() {
            return Err(Error::invalid_query("sequence must not be empty"));
        }
        Ok(RequestParams::new()
            .with("email", email)
            .with("program", "blastp")
            .with("task", "blastp")
            .with("stype", "protein")
            .with("exp", self.exp.as_str())
            .with("database", self.database.as_str())
            .with("sequence", sequence))
    }
}

/// A global pairwise alignment of two sequences
#[derive(Debug, Clone)]
pub struct NeedleQuery {
    asequence: String,
    bsequence: String,
    stype: String,
    fetch: FetchOptions,
}

impl NeedleQuery {
    /// Align the two given sequences, treated as protein by default
    #[must_use]
    pub fn new(asequence: impl Into<String>, bsequence: impl Into<String>) -> Self {
        Self {
            asequence: asequence.into(),
            bsequence: bsequence.into(),
            stype: "protein".to_string(),
            fetch: FetchOptions::default(),
        }
    }

    /// Set the sequence type (`protein` or `dna`)
    #[must_use]
    pub fn with_sequence_type(mut self, stype: impl Into<String>) -> Self {
        self.stype = stype.into();
        self
    }

    /// Apply cache interaction flags to the run and every result fetch
    #[must_use]
    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// The cache interaction flags this query carries
    #[must_use]
    pub fn fetch_options(&self) -> FetchOptions {
        self.fetch
    }

    pub(crate) fn params(&self, email: &str) -> Result<RequestParams> {
        let asequence = self.asequence.trim();
        let bsequence = self.bsequence.trim();
        if asequence.is_empty() || bsequence.is_empty() {
            return Err(Error::invalid_query("both sequences must be non-empty"));
        }
        Ok(RequestParams::new()
            .with("email", email)
            .with("stype", self.stype.as_str())
            .with("asequence", asequence)
            .with("bsequence", bsequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // BlastpQuery tests
    // ==========================================================================

    #[test]
    fn test_blastp_params_pin_the_service_parameters() {
        let params = BlastpQuery::new("MKTAYIAKQR")
            .params("someone@example.org")
            .unwrap();

        assert_eq!(params.get("email"), Some("someone@example.org"));
        assert_eq!(params.get("program"), Some("blastp"));
        assert_eq!(params.get("task"), Some("blastp"));
        assert_eq!(params.get("stype"), Some("protein"));
        assert_eq!(params.get("exp"), Some("1e-10"));
        assert_eq!(params.get("database"), Some("uniprotkb"));
        assert_eq!(params.get("sequence"), Some("MKTAYIAKQR"));
    }

    #[test]
    fn test_blastp_builders_override_defaults() {
        let params = BlastpQuery::new("MKTAYIAKQR")
            .with_expectation("1e-3")
            .with_database("uniprotkb_swissprot")
            .params("someone@example.org")
            .unwrap();

        assert_eq!(params.get("exp"), Some("1e-3"));
        assert_eq!(params.get("database"), Some("uniprotkb_swissprot"));
    }

    #[test]
    fn test_blastp_sequence_is_trimmed() {
        let params = BlastpQuery::new("  MKTAYIAKQR\n")
            .params("someone@example.org")
            .unwrap();
        assert_eq!(params.get("sequence"), Some("MKTAYIAKQR"));
    }

    #[test]
    fn test_blastp_blank_sequence_is_rejected() {
        let err = BlastpQuery::new("   ")
            .params("someone@example.org")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }), "got {err:?}");
    }

    // ==========================================================================
    // NeedleQuery tests
    // ==========================================================================

    #[test]
    fn test_needle_params() {
        let params = NeedleQuery::new("MKTAYIAKQR", "MKTAYIAKHD")
            .params("someone@example.org")
            .unwrap();

        assert_eq!(params.get("email"), Some("someone@example.org"));
        assert_eq!(params.get("stype"), Some("protein"));
        assert_eq!(params.get("asequence"), Some("MKTAYIAKQR"));
        assert_eq!(params.get("bsequence"), Some("MKTAYIAKHD"));
    }

    #[test]
    fn test_needle_rejects_a_blank_side() {
        let err = NeedleQuery::new("MKTAYIAKQR", " ")
            .params("someone@example.org")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }), "got {err:?}");
    }

    #[test]
    fn test_needle_sequence_type_override() {
        let params = NeedleQuery::new("ACGT", "ACGA")
            .with_sequence_type("dna")
            .params("someone@example.org")
            .unwrap();
        assert_eq!(params.get("stype"), Some("dna"));
    }
}
