//! Transcript formatting.
//!
//! The formatting gateway cleans up a raw transcript: punctuation and
//! capitalization, filler-word removal, inline voice-command substitution
//! and user-dictionary replacement. It never fails: any provider error
//! falls back to the raw transcript unmodified (logged only). This is a
//! deliberate degrade-gracefully policy, unlike transcription failure,
//! which aborts the pipeline.

mod groq;
mod prompt;
pub mod rules;

pub use groq::GroqFormatter;
pub use prompt::build_system_prompt;

use crate::settings::Dictionary;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Errors internal to formatting providers. They never cross the gateway
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No API key configured")]
    NoApiKey,
}

/// A text-formatting backend.
#[async_trait]
pub trait FormatProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, transcript: &str)
        -> Result<String, FormatError>;

    fn name(&self) -> &'static str;
}

/// Offline formatter applying the fixed voice-command vocabulary, filler
/// removal and sentence capitalization. Used when no API key is
/// configured, and directly testable.
pub struct LocalRulesFormatter;

#[async_trait]
impl FormatProvider for LocalRulesFormatter {
    async fn complete(
        &self,
        _system_prompt: &str,
        transcript: &str,
    ) -> Result<String, FormatError> {
        Ok(rules::format_locally(transcript))
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

/// Formatting gateway: infallible at the call boundary.
pub struct FormattingGateway {
    provider: Arc<dyn FormatProvider>,
}

impl FormattingGateway {
    pub fn new(provider: Arc<dyn FormatProvider>) -> Self {
        Self { provider }
    }

    /// Build the production gateway: Groq chat formatting when an API key
    /// is configured, local rules otherwise.
    pub fn from_key(groq_api_key: String) -> Self {
        if groq_api_key.is_empty() {
            log::info!("No Groq API key configured, formatting with local rules");
            Self::new(Arc::new(LocalRulesFormatter))
        } else {
            Self::new(Arc::new(GroqFormatter::new(groq_api_key)))
        }
    }

    /// Format a transcript. Never raises: on any provider failure the raw
    /// transcript is returned unmodified.
    ///
    /// Dictionary replacement is always applied locally after a successful
    /// provider pass (term-for-term, case-sensitive) because a model
    /// cannot guarantee literal replacement.
    pub async fn format(&self, raw: &str, dictionary: &Dictionary) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let started = Instant::now();
        let system_prompt = build_system_prompt(dictionary);

        match self.provider.complete(&system_prompt, raw).await {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    log::warn!(
                        "Formatting via {} returned empty output, keeping raw transcript",
                        self.provider.name()
                    );
                    return raw.to_string();
                }

                log::info!(
                    "Formatting via {} done in {}ms: {} -> {} chars",
                    self.provider.name(),
                    started.elapsed().as_millis(),
                    raw.len(),
                    text.len()
                );
                rules::apply_dictionary(&text, dictionary)
            }
            Err(e) => {
                log::warn!(
                    "Formatting via {} failed after {}ms ({} chars), keeping raw transcript: {}",
                    self.provider.name(),
                    started.elapsed().as_millis(),
                    raw.len(),
                    e
                );
                raw.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl FormatProvider for FailingProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _transcript: &str,
        ) -> Result<String, FormatError> {
            Err(FormatError::Api("boom".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl FormatProvider for EchoProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            transcript: &str,
        ) -> Result<String, FormatError> {
            Ok(transcript.to_string())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_raw_transcript() {
        let gateway = FormattingGateway::new(Arc::new(FailingProvider));
        let out = gateway.format("hello world", &Dictionary::new()).await;
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn dictionary_applies_after_successful_formatting() {
        let gateway = FormattingGateway::new(Arc::new(EchoProvider));
        let dictionary: Dictionary =
            [("stayfree".to_string(), "StayFree".to_string())].into_iter().collect();

        let out = gateway.format("i love stayfree", &dictionary).await;
        assert_eq!(out, "i love StayFree");
    }

    #[tokio::test]
    async fn empty_transcript_formats_to_empty() {
        let gateway = FormattingGateway::new(Arc::new(EchoProvider));
        assert_eq!(gateway.format("   ", &Dictionary::new()).await, "");
    }

    #[tokio::test]
    async fn empty_provider_output_keeps_raw() {
        struct BlankProvider;

        #[async_trait]
        impl FormatProvider for BlankProvider {
            async fn complete(
                &self,
                _system_prompt: &str,
                _transcript: &str,
            ) -> Result<String, FormatError> {
                Ok("  ".to_string())
            }

            fn name(&self) -> &'static str {
                "blank"
            }
        }

        let gateway = FormattingGateway::new(Arc::new(BlankProvider));
        let out = gateway.format("hello world", &Dictionary::new()).await;
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn local_rules_formatter_applies_vocabulary() {
        let gateway = FormattingGateway::new(Arc::new(LocalRulesFormatter));
        let out = gateway
            .format(
                "how are you question mark i am fine exclamation mark",
                &Dictionary::new(),
            )
            .await;
        assert_eq!(out, "How are you? I am fine!");
    }
}
