use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::RowSet;

use super::{Result, TransformError, Transformed, Transformer};

/// Polling policy for the relay: start fast, back off multiplicatively, and
/// give up at the deadline instead of waiting forever.
#[derive(Debug, Clone, Copy)]
pub struct RelayOptions {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff: f64,
    pub deadline: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            backoff: 1.5,
            deadline: Duration::from_secs(120),
        }
    }
}

/// Gateway that goes through a remote job-execution API instead of calling
/// the completion endpoint itself: dispatch a named job carrying the prompt
/// and dataset, then poll the run until it completes and read the model text
/// out of its output field.
pub struct RelayGateway {
    client: reqwest::Client,
    base_url: String,
    job: String,
    token: Option<String>,
    options: RelayOptions,
}

#[derive(Serialize)]
struct DispatchRequest<'a> {
    job: &'a str,
    inputs: DispatchInputs<'a>,
}

#[derive(Serialize)]
struct DispatchInputs<'a> {
    user_prompt: String,
    table_data: &'a Value,
}

#[derive(Deserialize)]
struct DispatchResponse {
    id: String,
}

#[derive(Deserialize)]
struct RunStatus {
    status: String,
    output: Option<String>,
    error: Option<String>,
}

impl RelayGateway {
    pub fn new(
        base_url: &str,
        job: &str,
        token: Option<String>,
        options: RelayOptions,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            job: job.to_string(),
            token,
            options,
        })
    }

    async fn dispatch(&self, instruction: &str, dataset: &Value) -> Result<String> {
        let payload = DispatchRequest {
            job: &self.job,
            inputs: DispatchInputs {
                user_prompt: instruction.to_string(),
                table_data: dataset,
            },
        };
        let url = format!("{}/runs", self.base_url);
        let mut request = self.client.post(&url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|err| TransformError::Upstream {
            detail: err.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransformError::Upstream {
                detail: format!("job dispatch failed: HTTP {status}"),
            });
        }
        let dispatched: DispatchResponse =
            response
                .json()
                .await
                .map_err(|err| TransformError::Upstream {
                    detail: format!("job dispatch reply unreadable: {err}"),
                })?;
        tracing::debug!(run = %dispatched.id, job = %self.job, "relay job dispatched");
        Ok(dispatched.id)
    }

    async fn poll(&self, run_id: &str) -> Result<String> {
        let started = Instant::now();
        let mut interval = self.options.initial_interval;
        loop {
            if started.elapsed() >= self.options.deadline {
                return Err(TransformError::Timeout {
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(interval).await;
            interval = next_interval(interval, &self.options);

            let url = format!("{}/runs/{run_id}", self.base_url);
            let mut request = self.client.get(&url);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await.map_err(|err| TransformError::Upstream {
                detail: err.to_string(),
            })?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransformError::Upstream {
                    detail: format!("run status check failed: HTTP {status}"),
                });
            }
            let run: RunStatus = response
                .json()
                .await
                .map_err(|err| TransformError::Upstream {
                    detail: format!("run status reply unreadable: {err}"),
                })?;

            tracing::trace!(run = %run_id, status = %run.status, "relay poll");
            match run.status.as_str() {
                "completed" => {
                    return run.output.ok_or_else(|| TransformError::MalformedReply {
                        detail: "completed run had no output".to_string(),
                    });
                }
                "failed" => {
                    return Err(TransformError::Upstream {
                        detail: run.error.unwrap_or_else(|| "run failed".to_string()),
                    });
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl Transformer for RelayGateway {
    async fn transform(&self, rowset: &RowSet, instruction: &str) -> Result<Transformed> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(TransformError::EmptyInstruction);
        }
        let dataset = super::dataset_value(rowset);
        let run_id = self.dispatch(instruction, &dataset).await?;
        let content = self.poll(&run_id).await?;
        super::parse_reply(&content)
    }
}

pub(super) fn next_interval(current: Duration, options: &RelayOptions) -> Duration {
    current.mul_f64(options.backoff).min(options.max_interval)
}
