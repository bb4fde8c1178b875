//! Groq Whisper transcription (English path).

use super::{SttError, TranscriptionProvider};
use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;

const GROQ_TRANSCRIPTIONS_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const MODEL: &str = "whisper-large-v3-turbo";

/// Groq Whisper API provider, tuned for fast accurate English output.
pub struct GroqTranscriber {
    client: reqwest::Client,
    api_key: String,
}

impl GroqTranscriber {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self { client, api_key }
    }
}

#[async_trait]
impl TranscriptionProvider for GroqTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::Config("Groq API key not configured".to_string()));
        }

        let part = multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Audio(format!("Failed to create multipart: {}", e)))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", MODEL)
            .text("language", "en");

        let response = self
            .client
            .post(GROQ_TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SttError::Api(format!(
                "Groq API error ({}): {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response.json().await?;
        let text = result["text"].as_str().unwrap_or("").to_string();

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name() {
        let provider = GroqTranscriber::new("test-key".to_string());
        assert_eq!(provider.name(), "groq");
    }

    #[tokio::test]
    async fn missing_api_key_is_config_error() {
        let provider = GroqTranscriber::new(String::new());
        let err = provider.transcribe(b"wav").await.unwrap_err();
        assert!(matches!(err, SttError::Config(_)));
    }
}
