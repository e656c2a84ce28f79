use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::RelayError;
use crate::models::{ChatRequest, Completion, Message, Usage};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

// Anything that can turn a chat request into a completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, RelayError>;
}

// OpenAI request body
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

// OpenAI response body, only the parts we forward
#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

// {"error": {"message": "...", "code": "..."}}
#[derive(Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    code: Option<String>,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Upstream(format!("Failed to build HTTP client: {e}")))?;

        let api_key = api_key.filter(|key| !key.is_empty());
        if api_key.is_none() {
            tracing::warn!("No OpenAI API key configured, completions will answer 503");
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<Completion, RelayError> {
        let api_key = self.api_key.as_deref().ok_or(RelayError::MissingApiKey)?;

        let body = OpenAiRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Upstream(format!("Request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "OpenAI API error: {text}");
            return Err(map_error(status, &text));
        }

        let parsed: OpenAiResponse = res
            .json()
            .await
            .map_err(|e| RelayError::Upstream(format!("Parse error: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::Upstream("No choices in completion".to_string()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            usage: parsed.usage,
        })
    }
}

fn map_error(status: StatusCode, text: &str) -> RelayError {
    let detail = serde_json::from_str::<OpenAiErrorBody>(text).ok().map(|b| b.error);

    if detail
        .as_ref()
        .and_then(|d| d.code.as_deref())
        .is_some_and(|code| code == "context_length_exceeded")
    {
        return RelayError::InputTooLong;
    }

    match status {
        StatusCode::UNAUTHORIZED => RelayError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => RelayError::UpstreamRateLimited,
        _ => RelayError::Upstream(match detail {
            Some(d) => d.message,
            None if text.is_empty() => format!("provider returned {status}"),
            None => text.to_string(),
        }),
    }
}
