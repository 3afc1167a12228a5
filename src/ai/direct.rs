use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::RowSet;

use super::{Result, SYSTEM_PROMPT, TransformError, Transformed, Transformer};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Gateway that talks to an OpenRouter-compatible chat-completion endpoint
/// directly. The credential is supplied by the caller (environment or flag),
/// never embedded.
pub struct DirectGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl DirectGateway {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Transformer for DirectGateway {
    async fn transform(&self, rowset: &RowSet, instruction: &str) -> Result<Transformed> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(TransformError::EmptyInstruction);
        }

        let dataset = super::dataset_value(rowset);
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: super::build_user_prompt(instruction, &dataset),
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(%url, model = %self.model, rows = rowset.len(), "dispatching transform");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| TransformError::Upstream {
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::Upstream {
                detail: upstream_detail(status, &body),
            });
        }

        let reply: ChatResponse =
            response
                .json()
                .await
                .map_err(|err| TransformError::MalformedReply {
                    detail: err.to_string(),
                })?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TransformError::MalformedReply {
                detail: "reply was empty".to_string(),
            })?;

        super::parse_reply(&content)
    }
}

/// Prefers the structured `{"error": {"message": ...}}` shape the upstream
/// uses; falls back to the raw status line.
fn upstream_detail(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}
