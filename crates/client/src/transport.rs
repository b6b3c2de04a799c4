//! Wire transport to the job dispatcher REST API

use crate::error::{Error, Result};
use async_trait::async_trait;
use ebitools_cache::RequestParams;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::debug;

/// Identifier of a submitted job, as issued by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wrap a raw job identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw response to a job submission
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body; the job id on success, an error document otherwise
    pub body: String,
}

/// Low-level operations against a job dispatcher service
///
/// The production implementation is [`RestTransport`]; tests substitute
/// scripted implementations from the [`testing`](crate::testing) module.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Submit a job to a service, returning the raw response
    async fn submit_job(&self, service: &str, params: &RequestParams) -> Result<SubmitResponse>;

    /// Fetch the current status token for a job
    async fn job_status(&self, service: &str, job: &JobHandle) -> Result<String>;

    /// Fetch one result payload of a finished job
    async fn fetch_result(
        &self,
        service: &str,
        job: &JobHandle,
        output: &str,
    ) -> Result<Vec<u8>>;
}

/// [`JobTransport`] backed by the dispatcher's REST API
///
/// Submissions are form-encoded POSTs to `{base}/{service}/run`; status and
/// results are plain GETs. Status responses are requested as `text/plain`,
/// result payloads are fetched as raw bytes.
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
    base_url: String,
}

impl RestTransport {
    /// Create a transport for the given API root
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("ebitools")
            .build()
            .map_err(|e| Error::http(e, "client setup"))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl JobTransport for RestTransport {
    async fn submit_job(&self, service: &str, params: &RequestParams) -> Result<SubmitResponse> {
        let url = format!("{}/{}/run", self.base_url, service);
        debug!(%url, "Submitting job");

        let form: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "text/plain")
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::http(e, "submit"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(e, "submit"))?;
        Ok(SubmitResponse { status, body })
    }

    async fn job_status(&self, service: &str, job: &JobHandle) -> Result<String> {
        let url = format!("{}/{}/status/{}", self.base_url, service, job);
        debug!(%url, "Checking job status");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|e| Error::http(e, "status"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::server(status, body, "status"));
        }

        response.text().await.map_err(|e| Error::http(e, "status"))
    }

    async fn fetch_result(
        &self,
        service: &str,
        job: &JobHandle,
        output: &str,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/{}/result/{}/{}", self.base_url, service, job, output);
        debug!(%url, "Fetching job result");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::http(e, "result"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::server(status, body, "result"));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::http(e, "result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_handle_display() {
        let handle = JobHandle::new("ncbiblast-R20260822-abcdef12");
        assert_eq!(handle.to_string(), "ncbiblast-R20260822-abcdef12");
        assert_eq!(handle.as_str(), "ncbiblast-R20260822-abcdef12");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport = RestTransport::new("https://www.ebi.ac.uk/Tools/services/rest/").unwrap();
        assert_eq!(transport.base_url, "https://www.ebi.ac.uk/Tools/services/rest");
    }
}
