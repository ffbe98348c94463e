//! Bounded status polling.

use std::future::Future;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::models::config::ClientConfig;
use crate::models::job::{JobHandle, JobResult, JobStatus, ResultPayload};
use crate::transport::{ApiRequest, Transport};

use super::status::parse_status;

/// Diagnostic used when a failed job carries no message.
pub const NO_DIAGNOSTIC: &str = "job failed without diagnostic";

/// Polls a job handle until the job finishes or the wait runs out.
///
/// `pending` and `processing` loop on the configured interval. A body that
/// cannot be decoded counts as `pending` and spends the same time budget.
/// Transport faults and non-2xx replies end the wait on first sight.
pub struct JobPoller<'a, T> {
    config: &'a ClientConfig,
    transport: &'a T,
}

impl<'a, T: Transport> JobPoller<'a, T> {
    pub fn new(config: &'a ClientConfig, transport: &'a T) -> Self {
        Self { config, transport }
    }

    /// Wait for the job behind `handle` to finish.
    pub async fn await_completion(&self, handle: &JobHandle) -> Result<JobResult> {
        self.await_completion_until(handle, std::future::pending()).await
    }

    /// Like [`await_completion`](Self::await_completion), but gives up with
    /// [`ClientError::Cancelled`] as soon as `cancel` resolves.
    pub async fn await_completion_until<C>(&self, handle: &JobHandle, cancel: C) -> Result<JobResult>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let started = Instant::now();
        let interval = self.config.polling_interval();
        let mut polls: u32 = 0;

        loop {
            polls += 1;

            let response = tokio::select! {
                biased;
                _ = &mut cancel => return Err(ClientError::Cancelled),
                response = self.transport.send(ApiRequest::get(handle.as_str())) => response?,
            };

            if !response.is_success() {
                return Err(ClientError::Http {
                    status: response.status,
                    body: response.body_text(),
                });
            }

            match parse_status(&response.body) {
                Ok(report) => match report.status {
                    JobStatus::Success => {
                        info!(
                            "Job {} finished after {} polls in {:?}",
                            handle,
                            polls,
                            started.elapsed()
                        );
                        return Ok(JobResult {
                            id: report.id,
                            job_type: report.job_type,
                            status: JobStatus::Success,
                            payload: report
                                .result
                                .map(ResultPayload::new)
                                .unwrap_or_else(ResultPayload::null),
                        });
                    }
                    JobStatus::Failed => {
                        let diagnostic =
                            report.diagnostic.unwrap_or_else(|| NO_DIAGNOSTIC.to_string());
                        warn!("Job {} failed: {}", handle, diagnostic);
                        return Err(ClientError::JobFailed { diagnostic });
                    }
                    status => debug!("Job {} is {} (poll {})", handle, status, polls),
                },
                Err(reason) => {
                    warn!("Unreadable status body for {} (poll {}): {}", handle, polls, reason);
                }
            }

            let elapsed = started.elapsed();
            if self.config.max_wait().is_exceeded(elapsed) {
                return Err(ClientError::Timeout { waited: elapsed });
            }

            let delay = match response.retry_after {
                Some(retry_after) if self.config.respect_retry_after() => retry_after,
                _ => interval,
            };

            tokio::select! {
                biased;
                _ = &mut cancel => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
