//! Sarvam Saaras transcription (Hindi/Hinglish path).
//!
//! Uses `mode=translit` for Roman-script output of code-mixed speech
//! ("mera phone number hai ..."). The API also offers `transcribe`
//! (Devanagari), `codemix` (mixed script) and `translate` modes.

use super::{SttError, TranscriptionProvider};
use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;

const SARVAM_STT_URL: &str = "https://api.sarvam.ai/speech-to-text";
const MODEL: &str = "saaras:v3";
const MODE: &str = "translit";

/// Sarvam speech-to-text provider for code-mixed Hindi/English speech.
pub struct SarvamTranscriber {
    client: reqwest::Client,
    api_key: String,
}

impl SarvamTranscriber {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self { client, api_key }
    }
}

#[async_trait]
impl TranscriptionProvider for SarvamTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::Config("Sarvam API key not configured".to_string()));
        }

        let part = multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Audio(format!("Failed to create multipart: {}", e)))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", MODEL)
            .text("mode", MODE);

        let response = self
            .client
            .post(SARVAM_STT_URL)
            .header("api-subscription-key", &self.api_key)
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
                "Sarvam API error ({}): {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response.json().await?;

        if let Some(language_code) = result["language_code"].as_str() {
            log::debug!("Sarvam detected language: {}", language_code);
        }

        let transcript = result["transcript"].as_str().unwrap_or("").to_string();

        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "sarvam"
    }
}
