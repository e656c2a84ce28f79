use serde::{Deserialize, Serialize};
use crate::error::RelayError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

// Single chat message
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

// Frontend request format
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    // accepted for compatibility, responses are never streamed
    #[serde(default)]
    pub stream: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl ChatRequest {
    // Range checks only, empty messages are rejected after the rate limiter
    pub fn validate(&self) -> Result<(), RelayError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RelayError::InvalidRequest(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 || self.max_tokens > 4096 {
            return Err(RelayError::InvalidRequest(format!(
                "max_tokens must be between 1 and 4096, got {}",
                self.max_tokens
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

// What a provider hands back for one request
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

// Normalized response sent to the frontend
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatResponse {
    pub message: Message,
    pub usage: Option<Usage>,
    pub model: String,
    pub created: i64,
}

impl ChatResponse {
    pub fn new(model: String, completion: Completion) -> Self {
        Self {
            message: Message {
                role: "assistant".to_string(),
                content: completion.content,
            },
            usage: completion.usage,
            model,
            created: chrono::Utc::now().timestamp(),
        }
    }
}
