//! Job submission and status polling

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::transport::{JobHandle, JobTransport};
use ebitools_cache::RequestParams;
use std::time::Duration;
use tracing::{debug, info};

/// Status of a submitted job as reported by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// The job is queued or executing
    Running,
    /// The job completed and results can be fetched
    Finished,
}

impl JobStatus {
    /// Parse a status token from the dispatcher
    ///
    /// Anything other than `RUNNING` or `FINISHED` (`FAILURE`, `ERROR`,
    /// `NOT_FOUND`, ...) is returned as `None` for the caller to report.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "RUNNING" => Some(Self::Running),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Backoff state for status polling
///
/// The first wait is one second, and the wait grows by one second after
/// every check until it reaches `backoff_limit`. Once `attempts_threshold`
/// waits have been handed out the schedule is exhausted.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    config: PollConfig,
    attempt: u32,
    wait: Duration,
}

impl PollSchedule {
    /// Create a schedule for the given configuration
    #[must_use]
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            attempt: 1,
            wait: Duration::from_secs(1),
        }
    }

    /// The wait to observe before the next status check, or `None` once the
    /// attempt budget is spent
    pub fn next_wait(&mut self) -> Option<Duration> {
        if self.attempt > self.config.attempts_threshold {
            return None;
        }
        let wait = self.wait;
        self.attempt += 1;
        if self.wait < Duration::from_secs(self.config.backoff_limit) {
            self.wait += Duration::from_secs(1);
        }
        Some(wait)
    }

    /// Number of waits handed out so far
    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        self.attempt - 1
    }
}

/// Submit a job and return its handle
pub(crate) async fn submit(
    transport: &dyn JobTransport,
    service: &str,
    params: &RequestParams,
) -> Result<JobHandle> {
    let response = transport.submit_job(service, params).await?;
    if !(200..300).contains(&response.status) {
        return Err(Error::submission(response.status, response.body));
    }

    let id = response.body.trim();
    if id.is_empty() {
        return Err(Error::protocol("submission succeeded but no job id was returned"));
    }
    info!(service, job_id = id, "Job submitted");
    Ok(JobHandle::new(id))
}

/// Poll a job until it finishes
///
/// Waits before every check, starting at one second and backing off per
/// [`PollSchedule`]. Fails with [`Error::UnexpectedStatus`] on the first
/// status outside `RUNNING`/`FINISHED`, and with [`Error::PollTimeout`] once
/// the attempt budget is spent.
pub(crate) async fn await_completion(
    transport: &dyn JobTransport,
    service: &str,
    job: &JobHandle,
    config: PollConfig,
    verbose: bool,
) -> Result<()> {
    let mut schedule = PollSchedule::new(config);
    while let Some(wait) = schedule.next_wait() {
        tokio::time::sleep(wait).await;
        let raw = transport.job_status(service, job).await?;
        match JobStatus::parse(&raw) {
            Some(JobStatus::Finished) => {
                info!(job_id = %job, attempts = schedule.attempts_made(), "Job finished");
                return Ok(());
            }
            Some(JobStatus::Running) => {
                if verbose {
                    info!(job_id = %job, attempt = schedule.attempts_made(), "Waiting for job");
                } else {
                    debug!(job_id = %job, attempt = schedule.attempts_made(), "Waiting for job");
                }
            }
            None => {
                return Err(Error::unexpected_status(job.as_str(), raw.trim()));
            }
        }
    }
    Err(Error::poll_timeout(job.as_str(), schedule.attempts_made()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    fn blast_params() -> RequestParams {
        RequestParams::new()
            .with("email", "someone@example.org")
            .with("program", "blastp")
            .with("sequence", "MKTAYIAKQR")
    }

    // ==========================================================================
    // JobStatus tests
    // ==========================================================================

    #[test]
    fn test_status_parse() {
        assert_eq!(JobStatus::parse("RUNNING"), Some(JobStatus::Running));
        assert_eq!(JobStatus::parse("FINISHED"), Some(JobStatus::Finished));
        assert_eq!(JobStatus::parse("FINISHED\n"), Some(JobStatus::Finished));
        assert_eq!(JobStatus::parse("FAILURE"), None);
        assert_eq!(JobStatus::parse("NOT_FOUND"), None);
        assert_eq!(JobStatus::parse(""), None);
    }

    // ==========================================================================
    // PollSchedule tests
    // ==========================================================================

    #[test]
    fn test_schedule_waits_grow_to_limit() {
        let mut schedule = PollSchedule::new(PollConfig {
            attempts_threshold: 6,
            backoff_limit: 3,
        });

        let mut waits = Vec::new();
        while let Some(wait) = schedule.next_wait() {
            waits.push(wait.as_secs());
        }

        assert_eq!(waits, vec![1, 2, 3, 3, 3, 3]);
        assert_eq!(schedule.attempts_made(), 6);
    }

    #[test]
    fn test_schedule_zero_attempt_budget() {
        let mut schedule = PollSchedule::new(PollConfig {
            attempts_threshold: 0,
            backoff_limit: 5,
        });
        assert_eq!(schedule.next_wait(), None);
        assert_eq!(schedule.attempts_made(), 0);
    }

    // ==========================================================================
    // Submission tests
    // ==========================================================================

    #[tokio::test]
    async fn test_submit_returns_handle() {
        let transport = MockTransport::new("ncbiblast-R20260822-abcdef12");
        let handle = submit(&transport, "ncbiblast", &blast_params())
            .await
            .unwrap();
        assert_eq!(handle.as_str(), "ncbiblast-R20260822-abcdef12");
        assert_eq!(transport.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejected_carries_server_response() {
        let transport = MockTransport::rejecting(400, "Invalid parameters: email");
        let err = submit(&transport, "ncbiblast", &blast_params())
            .await
            .unwrap_err();
        match err {
            Error::Submission { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid parameters: email");
            }
            other => panic!("expected Submission error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_empty_body_is_protocol_error() {
        let transport = MockTransport::new("  ");
        let err = submit(&transport, "ncbiblast", &blast_params())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");
    }

    // ==========================================================================
    // Polling tests (paused clock)
    // ==========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_at_finished() {
        let transport =
            MockTransport::new("job-1").with_statuses(["RUNNING", "RUNNING", "FINISHED"]);
        let handle = JobHandle::new("job-1");
        let start = tokio::time::Instant::now();

        await_completion(&transport, "ncbiblast", &handle, PollConfig::default(), false)
            .await
            .unwrap();

        // Waits of 1s, 2s and 3s before the three checks
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(transport.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_bounds_checks_and_waits() {
        let transport = MockTransport::new("job-1").with_statuses(["RUNNING"]);
        let handle = JobHandle::new("job-1");
        let config = PollConfig {
            attempts_threshold: 3,
            backoff_limit: 2,
        };
        let start = tokio::time::Instant::now();

        let err = await_completion(&transport, "ncbiblast", &handle, config, false)
            .await
            .unwrap_err();

        // Waits of 1s, 2s and 2s; exactly three checks, then the budget is spent
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(transport.status_calls(), 3);
        match err {
            Error::PollTimeout { job_id, attempts } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected PollTimeout error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_status_fails_on_first_check() {
        let transport = MockTransport::new("job-1").with_statuses(["QUEUED"]);
        let handle = JobHandle::new("job-1");

        let err = await_completion(
            &transport,
            "ncbiblast",
            &handle,
            PollConfig::default(),
            false,
        )
        .await
        .unwrap_err();

        assert_eq!(transport.status_calls(), 1);
        match err {
            Error::UnexpectedStatus { job_id, status } => {
                assert_eq!(job_id, "job-1");
                assert_eq!(status, "QUEUED");
            }
            other => panic!("expected UnexpectedStatus error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_trailing_newline_is_tolerated() {
        let transport = MockTransport::new("job-1").with_statuses(["RUNNING\n", "FINISHED\n"]);
        let handle = JobHandle::new("job-1");

        await_completion(&transport, "ncbiblast", &handle, PollConfig::default(), false)
            .await
            .unwrap();
        assert_eq!(transport.status_calls(), 2);
    }
}
