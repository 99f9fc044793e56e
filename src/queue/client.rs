//! HTTP Task Queue Client
//!
//! Implements `TaskQueue` against a remote queue server (see `handlers`). Used by node
//! workers and by orchestrators that do not live in the queue's process.
//!
//! Read-type and run-state requests are retried with backoff on transport errors.
//! Task creation is sent exactly once: whether to retry a creation is the caller's call.

use super::backend::TaskQueue;
use super::error::QueueError;
use super::protocol::*;
use super::types::*;
use crate::collaboration::types::{NodeId, OrganizationId};

use async_trait::async_trait;
use rand::Rng;
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_ATTEMPTS: usize = 3;

pub struct HttpTaskQueue {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpTaskQueue {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a response into `T`, mapping error statuses back into `QueueError`.
    ///
    /// `not_found` builds the error reported for a 404, which depends on what was looked up.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        not_found: impl FnOnce() -> QueueError,
    ) -> Result<T, QueueError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| QueueError::Malformed(format!("invalid response body: {}", e)));
        }
        Err(Self::error_from(status, response, not_found).await)
    }

    async fn expect_success(
        response: reqwest::Response,
        not_found: impl FnOnce() -> QueueError,
    ) -> Result<(), QueueError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::error_from(status, response, not_found).await)
    }

    async fn error_from(
        status: reqwest::StatusCode,
        response: reqwest::Response,
        not_found: impl FnOnce() -> QueueError,
    ) -> QueueError {
        if status == reqwest::StatusCode::NOT_FOUND {
            return not_found();
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        QueueError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    /// Sends `request`, retrying transport failures with capped exponential backoff.
    ///
    /// Any HTTP response, error statuses included, ends the retry loop.
    async fn send_with_retry(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, QueueError> {
        let request = request.timeout(REQUEST_TIMEOUT);
        let mut delay_ms = 150u64;
        let mut last_error = String::from("retry attempts exhausted");

        for attempt in 1..=RETRY_ATTEMPTS {
            // Streaming bodies cannot be cloned; those get a single attempt.
            let Some(this_attempt) = request.try_clone() else {
                return request
                    .send()
                    .await
                    .map_err(|e| QueueError::Unreachable(e.to_string()));
            };

            match this_attempt.send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Queue request failed");
                    last_error = e.to_string();
                    if attempt < RETRY_ATTEMPTS {
                        let jitter = rand::thread_rng().gen_range(0..50);
                        tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                        delay_ms = (delay_ms * 2).min(1200);
                    }
                }
            }
        }

        Err(QueueError::Unreachable(last_error))
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    async fn create_task(&self, task: NewTask) -> Result<TaskHandle, QueueError> {
        let response = self
            .http_client
            .post(self.url(ENDPOINT_CREATE_TASK))
            .json(&task)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| QueueError::Unreachable(e.to_string()))?;

        Self::decode(response, || {
            QueueError::Unreachable("task endpoint not found".to_string())
        })
        .await
    }

    async fn poll(&self, task_id: &TaskId) -> Result<Vec<RunReport>, QueueError> {
        let url = self.url(&endpoint_with_id(ENDPOINT_TASK_RUNS, &task_id.0));
        let response = self.send_with_retry(self.http_client.get(url)).await?;

        let body: PollResponse =
            Self::decode(response, || QueueError::UnknownTask(task_id.clone())).await?;
        Ok(body.runs)
    }

    async fn list_organizations(&self) -> Result<Vec<OrganizationId>, QueueError> {
        let response = self
            .send_with_retry(self.http_client.get(self.url(ENDPOINT_ORGANIZATIONS)))
            .await?;

        let body: OrganizationsResponse = Self::decode(response, || {
            QueueError::Unreachable("organizations endpoint not found".to_string())
        })
        .await?;
        Ok(body.organizations)
    }

    async fn claim_run(
        &self,
        organization: OrganizationId,
        worker: &NodeId,
    ) -> Result<Option<ClaimedRun>, QueueError> {
        let payload = ClaimRunRequest {
            organization,
            worker: worker.clone(),
        };
        let request = self.http_client.post(self.url(ENDPOINT_CLAIM_RUN)).json(&payload);
        let response = self.send_with_retry(request).await?;

        let body: ClaimRunResponse = Self::decode(response, || {
            QueueError::Unreachable("claim endpoint not found".to_string())
        })
        .await?;
        Ok(body.run)
    }

    async fn renew_lease(&self, run_id: &RunId) -> Result<(), QueueError> {
        let url = self.url(&endpoint_with_id(ENDPOINT_RENEW_LEASE, &run_id.0));
        let response = self.send_with_retry(self.http_client.post(url)).await?;

        Self::expect_success(response, || QueueError::UnknownRun(run_id.clone())).await
    }

    async fn complete_run(
        &self,
        run_id: &RunId,
        worker: &NodeId,
        outcome: RunOutcome,
    ) -> Result<(), QueueError> {
        let url = self.url(&endpoint_with_id(ENDPOINT_COMPLETE_RUN, &run_id.0));
        let payload = CompleteRunRequest {
            worker: worker.clone(),
            outcome,
        };
        let response = self
            .send_with_retry(self.http_client.post(url).json(&payload))
            .await?;

        Self::expect_success(response, || QueueError::UnknownRun(run_id.clone())).await
    }
}
