//! Cached job execution
//!
//! [`JobRunner`] ties the transport, the polling loop and the cache store
//! together. Every request is fingerprinted; a submission is only performed
//! when no cached job id exists for the exact parameter set, and result
//! payloads are cached per `(job id, output)` pair so a completed analysis
//! can be replayed entirely offline.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::poll;
use crate::transport::{JobHandle, JobTransport, RestTransport};
use ebitools_cache::{CacheStore, Lookup, RequestParams, StoredValue};
use std::sync::Arc;
use tracing::debug;

/// Cache interaction flags for a single request
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Serve only from the cache and fail on a miss instead of submitting
    pub cached_only: bool,
    /// Drop any cached entry and execute the request again
    pub force_refresh: bool,
}

/// Job dispatcher client with fingerprint-cached execution
#[derive(Clone)]
pub struct JobRunner {
    transport: Arc<dyn JobTransport>,
    store: CacheStore,
    config: ClientConfig,
}

impl std::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JobRunner {
    /// Build a runner that talks to the configured dispatcher over HTTP
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(RestTransport::new(&config.base_url)?);
        Self::with_transport(config, transport)
    }

    /// Build a runner over a caller-supplied transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn JobTransport>) -> Result<Self> {
        if config.email.trim().is_empty() {
            return Err(Error::invalid_input("a contact e-mail address is required"));
        }
        let root = config.resolve_cache_root()?;
        Ok(Self {
            transport,
            store: CacheStore::new(root),
            config,
        })
    }

    /// The configuration this runner was built with
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The cache store backing this runner
    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Run a job to completion and return its handle
    ///
    /// On a cache hit the recorded job id is returned without any network
    /// traffic. Otherwise the job is submitted and polled until it finishes,
    /// and the id is cached only after the dispatcher reports `FINISHED`, so
    /// failed or timed-out submissions are retried on the next call.
    pub async fn run_job(
        &self,
        service: &str,
        params: &RequestParams,
        options: FetchOptions,
    ) -> Result<JobHandle> {
        if options.force_refresh {
            self.store.evict(service, params)?;
        }
        match self.store.begin(service, params)? {
            Lookup::Hit(value) => {
                let id = value
                    .as_text()
                    .ok_or_else(|| Error::protocol("cached job entry is not textual"))?;
                debug!(service, job_id = id, "Using cached job");
                Ok(JobHandle::new(id))
            }
            Lookup::Miss(intent) => {
                if options.cached_only {
                    let fingerprint = params.fingerprint()?;
                    return Err(Error::cache_miss(
                        service,
                        self.store.entry_path(service, &fingerprint),
                    ));
                }
                let handle = poll::submit(self.transport.as_ref(), service, params).await?;
                poll::await_completion(
                    self.transport.as_ref(),
                    service,
                    &handle,
                    self.config.poll,
                    self.config.verbose,
                )
                .await?;
                intent.commit(StoredValue::text(handle.as_str()))?;
                Ok(handle)
            }
        }
    }

    /// Fetch one output of a finished job
    ///
    /// Cached under the `(job id, output)` pair, so each output of a job is
    /// downloaded at most once.
    pub async fn fetch_output(
        &self,
        service: &str,
        job: &JobHandle,
        output: &str,
        options: FetchOptions,
    ) -> Result<StoredValue> {
        let params = RequestParams::new()
            .with("job_id", job.as_str())
            .with("output", output);
        if options.force_refresh {
            self.store.evict(service, &params)?;
        }
        match self.store.begin(service, &params)? {
            Lookup::Hit(value) => {
                debug!(service, job_id = %job, output, "Using cached result");
                Ok(value)
            }
            Lookup::Miss(intent) => {
                if options.cached_only {
                    let fingerprint = params.fingerprint()?;
                    return Err(Error::cache_miss(
                        service,
                        self.store.entry_path(service, &fingerprint),
                    ));
                }
                let payload = self.transport.fetch_result(service, job, output).await?;
                let value = StoredValue::from_payload(payload);
                intent.commit(value.clone())?;
                Ok(value)
            }
        }
    }
}
