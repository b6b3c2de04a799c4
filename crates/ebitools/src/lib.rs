//! Cached client for the EBI job dispatcher analysis services
//!
//! The EBI analysis tools run behind an asynchronous job dispatcher: a
//! request is submitted, the job is polled until it finishes, and its
//! outputs are then fetched by name. [`EbiClient`] drives that protocol and
//! caches every exchange on disk, keyed by a fingerprint of the request
//! parameters, so identical analyses never run twice and finished work can
//! be revisited offline.
//!
//! ```no_run
//! use ebitools::{BlastpQuery, ClientConfig, EbiClient, ImageFormat};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EbiClient::new(ClientConfig::new("someone@example.org"))?;
//! let job = client.blastp(BlastpQuery::new("MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQ")).await?;
//!
//! let report = job.report().await?;
//! for hit in report.simple_hits() {
//!     println!("{}\t{}\t{:.1}%\t{:e}", hit.accession, hit.species, hit.identity, hit.e_value);
//! }
//! job.visual(ImageFormat::Svg).await?.write_to_file("hits.svg")?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod query;

use ebitools_results::{alignment, blast};
use std::sync::Arc;

pub use ebitools_cache::{CacheStore, Fingerprint, RequestParams, StoredValue};
pub use ebitools_client::{
    ClientConfig, FetchOptions, JobHandle, JobRunner, JobStatus, JobTransport, PollConfig,
};
pub use ebitools_results::{
    AlignmentJob, AlignmentStats, BlastJob, BlastReport, Hit, Hsp, ImageFormat, Ratio,
    RenderedImage, SimpleHit,
};
pub use error::{Error, Result};
pub use query::{BlastpQuery, NeedleQuery};

/// High-level client for the analysis services
#[derive(Clone)]
pub struct EbiClient {
    runner: JobRunner,
}

impl EbiClient {
    /// Build a client that talks to the configured dispatcher over HTTP
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            runner: JobRunner::new(config)?,
        })
    }

    /// Build a client over a caller-supplied transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn JobTransport>) -> Result<Self> {
        Ok(Self {
            runner: JobRunner::with_transport(config, transport)?,
        })
    }

    /// The cached job runner behind this client
    #[must_use]
    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    /// Run a protein BLAST search and wait for its results
    ///
    /// A repeated query with identical parameters is served from the cache
    /// without contacting the service.
    pub async fn blastp(&self, query: BlastpQuery) -> Result<BlastJob> {
        let params = query.params(&self.runner.config().email)?;
        let fetch = query.fetch_options();
        let handle = self.runner.run_job(blast::SERVICE, &params, fetch).await?;
        Ok(BlastJob::new(self.runner.clone(), handle).with_fetch_options(fetch))
    }

    /// Run a global pairwise alignment and wait for its results
    pub async fn needle(&self, query: NeedleQuery) -> Result<AlignmentJob> {
        let params = query.params(&self.runner.config().email)?;
        let fetch = query.fetch_options();
        let handle = self
            .runner
            .run_job(alignment::SERVICE, &params, fetch)
            .await?;
        Ok(AlignmentJob::new(self.runner.clone(), handle).with_fetch_options(fetch))
    }
}
