use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::generator::{GenerationRequest, TextGenerator};
use crate::error::{ErrorKind, Result, TripError};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// OpenAI-compatible `chat/completions` backend.
#[derive(Clone, Debug)]
pub struct ChatClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build from `OPENAI_API_KEY` and `OPENAI_BASE_URL` / `OPENROUTER_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TripError::ApiKey(missing_api_key_message()))?;

        let mut client = Self::new(api_key);
        if let Ok(base_url) =
            std::env::var("OPENAI_BASE_URL").or_else(|_| std::env::var("OPENROUTER_BASE_URL"))
        {
            client = client.with_base_url(base_url);
        }
        Ok(client)
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
        });

        let response = self
            .http
            .post(build_chat_url(&self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "trip-planner-rs")
            .json(&body)
            .send()
            .await
            .map_err(|err| TripError::Network(format!("HTTP request failed: {err}")))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let response_text = response
            .text()
            .await
            .map_err(|err| TripError::Network(format!("Failed to read response: {err}")))?;

        if !status.is_success() {
            return Err(status_error(status, retry_after, &response_text));
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|err| TripError::InvalidResponse(format!("Failed to parse JSON: {err}")))?;

        if let Some(error) = response_json.get("error") {
            let message = api_message(error).unwrap_or_else(|| error.to_string());
            return Err(TripError::ServiceUnavailable(format!("API error: {}", message)));
        }

        let first_choice = response_json
            .get("choices")
            .and_then(|value| value.as_array())
            .and_then(|choices| choices.first())
            .ok_or_else(|| {
                TripError::InvalidResponse("Completion response contained no choices".to_string())
            })?;

        if first_choice.get("finish_reason").and_then(Value::as_str) == Some("content_filter") {
            return Err(TripError::Model(
                "Completion was blocked by the content filter".to_string(),
            ));
        }

        first_choice
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                TripError::InvalidResponse("Completion response missing message content".to_string())
            })
    }
}

pub(crate) fn missing_api_key_message() -> String {
    ErrorKind::ApiKey.final_message(0, 0)
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

fn api_message(error: &Value) -> Option<String> {
    error
        .get("message")
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
}

fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> TripError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("error").and_then(api_message))
        .unwrap_or_else(|| body.trim().to_string());
    let detail = format!("HTTP {} error: {}", status, message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TripError::ApiKey(detail),
        StatusCode::TOO_MANY_REQUESTS => match retry_after {
            Some(seconds) => TripError::RateLimit(format!("{}; retry after {}s", detail, seconds)),
            None => TripError::RateLimit(detail),
        },
        status if status.is_server_error() => TripError::ServiceUnavailable(detail),
        _ => TripError::Model(detail),
    }
}
