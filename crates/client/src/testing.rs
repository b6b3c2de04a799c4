//! Scripted transport for exercising the client without a network
//!
//! [`MockTransport`] plays back a configured submission response, a status
//! sequence and per-output result payloads, and counts every call so tests
//! can assert on request traffic.

#![allow(clippy::expect_used)]

use crate::error::{Error, Result};
use crate::transport::{JobHandle, JobTransport, SubmitResponse};
use async_trait::async_trait;
use ebitools_cache::RequestParams;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`JobTransport`] with scripted responses
pub struct MockTransport {
    submit_response: SubmitResponse,
    statuses: Mutex<VecDeque<String>>,
    results: Mutex<HashMap<String, Vec<u8>>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    result_calls: AtomicUsize,
}

impl MockTransport {
    /// Transport whose submissions succeed with the given job id
    #[must_use]
    pub fn new(job_id: &str) -> Self {
        Self {
            submit_response: SubmitResponse {
                status: 200,
                body: job_id.to_string(),
            },
            statuses: Mutex::new(VecDeque::new()),
            results: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            result_calls: AtomicUsize::new(0),
        }
    }

    /// Transport whose submissions are rejected with the given response
    #[must_use]
    pub fn rejecting(status: u16, body: &str) -> Self {
        let mut transport = Self::new("");
        transport.submit_response = SubmitResponse {
            status,
            body: body.to_string(),
        };
        transport
    }

    /// Script the status sequence; the last entry repeats forever
    ///
    /// With no script every status check reports `FINISHED`.
    #[must_use]
    pub fn with_statuses<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses
            .lock()
            .expect("status script lock poisoned")
            .extend(statuses.into_iter().map(Into::into));
        self
    }

    /// Provide the payload returned for a result output name
    #[must_use]
    pub fn with_result(self, output: &str, data: impl Into<Vec<u8>>) -> Self {
        self.results
            .lock()
            .expect("result map lock poisoned")
            .insert(output.to_string(), data.into());
        self
    }

    /// Number of submissions performed
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Number of status checks performed
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Number of result fetches performed
    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTransport for MockTransport {
    async fn submit_job(&self, _service: &str, _params: &RequestParams) -> Result<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.submit_response.clone())
    }

    async fn job_status(&self, _service: &str, _job: &JobHandle) -> Result<String> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().expect("status script lock poisoned");
        let status = if statuses.len() > 1 {
            statuses.pop_front().expect("script is non-empty")
        } else {
            statuses.front().cloned().unwrap_or_else(|| "FINISHED".to_string())
        };
        Ok(status)
    }

    async fn fetch_result(
        &self,
        _service: &str,
        _job: &JobHandle,
        output: &str,
    ) -> Result<Vec<u8>> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .expect("result map lock poisoned")
            .get(output)
            .cloned()
            .ok_or_else(|| {
                Error::server(404, format!("no scripted result for output {output}"), "result")
            })
    }
}
