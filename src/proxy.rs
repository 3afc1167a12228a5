use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::ai;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug)]
pub enum ConfigError {
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(f, "{API_KEY_ENV} is not set; refusing to start the relay")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Relay configuration. The credential is only ever read server-side, from
/// the process environment.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        Ok(Self {
            api_key,
            base_url: ai::DEFAULT_BASE_URL.to_string(),
            model: ai::DEFAULT_MODEL.to_string(),
        })
    }
}

struct ProxyState {
    client: reqwest::Client,
    config: ProxyConfig,
}

/// The relay surface: a single route accepting `POST` with
/// `{userPrompt, tableData}`. Anything else on the route answers 405.
pub fn router(config: ProxyConfig) -> reqwest::Result<Router> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(90))
        .build()?;
    let state = Arc::new(ProxyState { client, config });
    Ok(Router::new().route("/", post(relay)).with_state(state))
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    config: ProxyConfig,
) -> color_eyre::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "relay listening");
    axum::serve(listener, router(config)?).await?;
    Ok(())
}

async fn relay(
    State(state): State<Arc<ProxyState>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let parsed: Value = match serde_json::from_str(if body.is_empty() { "{}" } else { &body }) {
        Ok(value) => value,
        Err(_) => return invalid_body(),
    };
    let user_prompt = parsed
        .get("userPrompt")
        .and_then(Value::as_str)
        .filter(|prompt| !prompt.trim().is_empty());
    let table_data = parsed.get("tableData").and_then(Value::as_array);
    let (Some(user_prompt), Some(table_data)) = (user_prompt, table_data) else {
        return invalid_body();
    };

    let dataset = Value::Array(table_data.clone());
    let payload = json!({
        "model": state.config.model,
        "messages": [
            { "role": "system", "content": ai::SYSTEM_PROMPT },
            { "role": "user", "content": ai::build_user_prompt(user_prompt, &dataset) },
        ],
    });

    let url = format!(
        "{}/chat/completions",
        state.config.base_url.trim_end_matches('/')
    );
    tracing::debug!(rows = table_data.len(), "forwarding transform request");
    let response = match state
        .client
        .post(&url)
        .bearer_auth(&state.config.api_key)
        .json(&payload)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => return upstream_failure(err.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .text()
            .await
            .ok()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        return upstream_failure(detail);
    }

    match response.json::<Value>().await {
        Ok(upstream) => (StatusCode::OK, Json(upstream)),
        Err(err) => upstream_failure(err.to_string()),
    }
}

fn invalid_body() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request body" })),
    )
}

fn upstream_failure(detail: String) -> (StatusCode, Json<Value>) {
    tracing::warn!(%detail, "upstream completion request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": detail })),
    )
}
