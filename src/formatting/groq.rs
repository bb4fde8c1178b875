//! Groq chat-completions formatting provider.
//!
//! Groq exposes an OpenAI-compatible Chat Completions API; a small
//! instruction-following model with low temperature is enough for
//! transcript cleanup.

use super::{FormatError, FormatProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const MODEL: &str = "llama-3.1-8b-instant";

/// Low temperature for near-deterministic formatting output.
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1024;

pub struct GroqFormatter {
    client: Client,
    api_key: String,
}

impl GroqFormatter {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self { client, api_key }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl FormatProvider for GroqFormatter {
    async fn complete(
        &self,
        system_prompt: &str,
        transcript: &str,
    ) -> Result<String, FormatError> {
        if self.api_key.is_empty() {
            return Err(FormatError::NoApiKey);
        }

        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: transcript.to_string(),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(GROQ_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FormatError::Api(format!(
                "Groq API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| FormatError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| FormatError::InvalidResponse("No response choices returned".to_string()))
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}
