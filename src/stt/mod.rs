//! Speech-to-text providers.
//!
//! Two interchangeable providers sit behind one trait: Groq Whisper for
//! English, Sarvam Saaras for Hindi/Hinglish code-mixed speech. The
//! gateway picks one per call from the stored language preference; any
//! provider failure is fatal to the dictation pipeline (no fallback to
//! raw audio).

mod groq;
mod sarvam;

pub use groq::GroqTranscriber;
pub use sarvam::SarvamTranscriber;

use crate::settings::LanguagePreference;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Errors that can occur during transcription.
#[derive(Debug, thiserror::Error)]
pub enum SttError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Audio processing error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Trait for speech-to-text providers.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe WAV audio bytes to plain text.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SttError>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}

/// Normalize STT output text.
///
/// Whisper-style APIs may emit a leading space as a tokenization artifact;
/// trim only leading whitespace to avoid changing internal formatting.
fn normalize_stt_text(text: String) -> String {
    match text.chars().next() {
        Some(c) if c.is_whitespace() => text.trim_start().to_string(),
        _ => text,
    }
}

/// Selects a transcription provider per call based on language preference.
pub struct TranscriptionGateway {
    english: Arc<dyn TranscriptionProvider>,
    hinglish: Arc<dyn TranscriptionProvider>,
}

impl TranscriptionGateway {
    pub fn new(
        english: Arc<dyn TranscriptionProvider>,
        hinglish: Arc<dyn TranscriptionProvider>,
    ) -> Self {
        Self { english, hinglish }
    }

    /// Build the production gateway from stored API keys.
    pub fn from_keys(groq_api_key: String, sarvam_api_key: String) -> Self {
        Self::new(
            Arc::new(GroqTranscriber::new(groq_api_key)),
            Arc::new(SarvamTranscriber::new(sarvam_api_key)),
        )
    }

    pub async fn transcribe(
        &self,
        audio: &[u8],
        language: LanguagePreference,
    ) -> Result<String, SttError> {
        let provider = match language {
            LanguagePreference::English => &self.english,
            LanguagePreference::Hinglish => &self.hinglish,
        };

        let started = Instant::now();
        log::info!(
            "Transcribing {} bytes via {} ({})",
            audio.len(),
            provider.name(),
            language.as_str()
        );

        match provider.transcribe(audio).await {
            Ok(text) => {
                log::info!(
                    "Transcription done in {}ms: {} chars",
                    started.elapsed().as_millis(),
                    text.len()
                );
                Ok(normalize_stt_text(text))
            }
            Err(e) => {
                log::error!(
                    "Transcription failed after {}ms ({} bytes via {}): {}",
                    started.elapsed().as_millis(),
                    audio.len(),
                    provider.name(),
                    e
                );
                Err(e)
            }
        }
    }
}
