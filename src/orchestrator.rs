//! Dictation orchestrator: the state machine wiring hotkey/widget events
//! to the capture → transcribe → format → inject pipeline.
//!
//! States are linear: Idle → Recording → Processing → Idle, with
//! Recording → Idle reachable via cancel. A single mutex-guarded phase
//! field enforces mutual exclusion: at most one recording or pipeline is
//! in flight, and activation while busy is ignored rather than queued.
//! The lock is held only across transitions, never across awaits, so
//! input watching and UI queries stay responsive while a pipeline runs.
//!
//! Cancellation is cooperative: it only takes effect while Recording.
//! Once Processing begins the pipeline runs to completion or failure.

use crate::audio::{self, SoundType};
use crate::capture::{CaptureError, CaptureSession, CapturedAudio};
use crate::formatting::FormattingGateway;
use crate::history::HistoryStorage;
use crate::paste::Injector;
use crate::settings::SettingsSource;
use crate::stt::TranscriptionGateway;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// How a recording was initiated. Both paths share the same capture and
/// pipeline; they differ only in the displayed widget state and in the
/// click path offering an explicit Cancel affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingSource {
    Hotkey,
    Click,
}

/// Projection of orchestrator state for display; read-only to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetState {
    Idle,
    RecordingHotkey,
    RecordingClick,
    Processing,
}

/// Error kinds surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    NoInputDevice,
    AlreadyRecording,
    CaptureFailed,
    TranscriptionFailed,
    InjectionFailed,
}

/// Receives state changes and error notifications from the orchestrator.
pub trait StatusSink: Send + Sync {
    fn widget_state(&self, state: WidgetState);
    fn notify_error(&self, kind: ErrorKind, message: &str);
    /// A dictation finished and was appended to history.
    fn dictation_complete(&self, text: &str);
}

/// Holds the active gateway instances.
///
/// API keys are editable at runtime; saving them rebuilds the gateways
/// and swaps them here. The pipeline picks up the current instances at
/// the start of each run.
pub struct GatewaySlot {
    transcriber: RwLock<Arc<TranscriptionGateway>>,
    formatter: RwLock<Arc<FormattingGateway>>,
}

impl GatewaySlot {
    pub fn new(transcriber: Arc<TranscriptionGateway>, formatter: Arc<FormattingGateway>) -> Self {
        Self {
            transcriber: RwLock::new(transcriber),
            formatter: RwLock::new(formatter),
        }
    }

    /// Build production gateways from stored API keys.
    pub fn from_keys(groq_api_key: String, sarvam_api_key: String) -> Self {
        Self::new(
            Arc::new(TranscriptionGateway::from_keys(
                groq_api_key.clone(),
                sarvam_api_key,
            )),
            Arc::new(FormattingGateway::from_key(groq_api_key)),
        )
    }

    pub fn transcriber(&self) -> Arc<TranscriptionGateway> {
        self.transcriber
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn formatter(&self) -> Arc<FormattingGateway> {
        self.formatter
            .read()
            .map(|f| f.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Swap in gateways built from new API keys.
    pub fn reconfigure(&self, groq_api_key: String, sarvam_api_key: String) {
        let fresh = Self::from_keys(groq_api_key, sarvam_api_key);
        if let (Ok(mut t), Ok(mut f)) = (self.transcriber.write(), self.formatter.write()) {
            *t = fresh.transcriber();
            *f = fresh.formatter();
            log::info!("Gateways reconfigured");
        }
    }
}

/// Current phase plus the data the pipeline needs from the session.
enum Phase {
    Idle,
    Recording {
        source: RecordingSource,
        started_at: DateTime<Utc>,
        started_instant: Instant,
    },
    Processing,
}

struct Inner {
    capture: Box<dyn CaptureSession>,
    phase: Phase,
}

/// The dictation orchestrator. Cheap to clone; all collaborators are
/// constructor-injected and shared.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Mutex<Inner>>,
    gateways: Arc<GatewaySlot>,
    injector: Arc<dyn Injector>,
    history: Arc<HistoryStorage>,
    settings: Arc<dyn SettingsSource>,
    sink: Arc<dyn StatusSink>,
}

impl Orchestrator {
    pub fn new(
        capture: Box<dyn CaptureSession>,
        gateways: Arc<GatewaySlot>,
        injector: Arc<dyn Injector>,
        history: Arc<HistoryStorage>,
        settings: Arc<dyn SettingsSource>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                capture,
                phase: Phase::Idle,
            })),
            gateways,
            injector,
            history,
            settings,
            sink,
        }
    }

    /// Current widget-facing state.
    pub fn widget_state(&self) -> WidgetState {
        self.inner
            .lock()
            .map(|inner| match inner.phase {
                Phase::Idle => WidgetState::Idle,
                Phase::Recording {
                    source: RecordingSource::Hotkey,
                    ..
                } => WidgetState::RecordingHotkey,
                Phase::Recording {
                    source: RecordingSource::Click,
                    ..
                } => WidgetState::RecordingClick,
                Phase::Processing => WidgetState::Processing,
            })
            .unwrap_or(WidgetState::Idle)
    }

    /// Begin a recording. No-op while already recording or processing;
    /// re-presses are ignored, not queued.
    pub fn activation_start(&self, source: RecordingSource) {
        let sound_enabled = self.settings.sound_enabled();
        let device = self.settings.input_device();

        let outcome = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    log::error!("Orchestrator lock poisoned: {}", e);
                    return;
                }
            };

            if !matches!(inner.phase, Phase::Idle) {
                log::debug!("Activation start ignored, not idle");
                return;
            }

            match inner.capture.start(device.as_deref()) {
                Ok(()) => {
                    inner.phase = Phase::Recording {
                        source,
                        started_at: Utc::now(),
                        started_instant: Instant::now(),
                    };
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                log::info!("Recording started ({:?})", source);
                if sound_enabled {
                    audio::play_sound(SoundType::RecordingStart);
                }
                self.sink.widget_state(self.widget_state());
            }
            Err(e) => {
                log::error!("Failed to start recording: {}", e);
                self.sink.notify_error(capture_error_kind(&e), &e.to_string());
            }
        }
    }

    /// Finish a recording and run the pipeline to completion.
    ///
    /// An empty recording returns straight to Idle: that is normal flow
    /// (an accidental tap), not an error.
    pub async fn activation_stop(&self) {
        let sound_enabled = self.settings.sound_enabled();

        let (captured, started_at, started_instant) = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    log::error!("Orchestrator lock poisoned: {}", e);
                    return;
                }
            };

            let (started_at, started_instant) = match inner.phase {
                Phase::Recording {
                    started_at,
                    started_instant,
                    ..
                } => (started_at, started_instant),
                _ => {
                    log::debug!("Activation stop ignored, not recording");
                    return;
                }
            };

            match inner.capture.stop() {
                Ok(captured) => {
                    inner.phase = Phase::Processing;
                    (captured, started_at, started_instant)
                }
                Err(CaptureError::EmptyRecording) => {
                    log::info!("Empty recording, returning to idle");
                    inner.phase = Phase::Idle;
                    drop(inner);
                    self.sink.widget_state(WidgetState::Idle);
                    return;
                }
                Err(e) => {
                    log::error!("Failed to stop recording: {}", e);
                    inner.phase = Phase::Idle;
                    drop(inner);
                    self.sink.notify_error(ErrorKind::CaptureFailed, &e.to_string());
                    self.sink.widget_state(WidgetState::Idle);
                    return;
                }
            }
        };

        self.sink.widget_state(WidgetState::Processing);
        if sound_enabled {
            audio::play_sound(SoundType::RecordingStop);
        }

        self.run_pipeline(captured, started_at, started_instant).await;

        self.reset_to_idle();
    }

    /// Discard the current recording. Only honored while Recording; once
    /// Processing has begun the pipeline is not interruptible.
    pub fn cancel(&self) {
        let cancelled = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    log::error!("Orchestrator lock poisoned: {}", e);
                    return;
                }
            };

            match inner.phase {
                Phase::Recording { .. } => {
                    inner.capture.cancel();
                    inner.phase = Phase::Idle;
                    true
                }
                _ => {
                    log::debug!("Cancel ignored, nothing to cancel");
                    false
                }
            }
        };

        if cancelled {
            log::info!("Recording cancelled");
            self.sink.widget_state(WidgetState::Idle);
        }
    }

    /// The sequential transcribe → format → inject → history pipeline.
    /// Exactly one instance runs at a time (guarded by the Processing
    /// phase).
    async fn run_pipeline(
        &self,
        captured: CapturedAudio,
        started_at: DateTime<Utc>,
        started_instant: Instant,
    ) {
        let language = self.settings.language();
        let transcriber = self.gateways.transcriber();
        let formatter = self.gateways.formatter();

        let raw_transcript = match transcriber
            .transcribe(&captured.wav_bytes, language)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                // Transcription failure is fatal: no fallback to raw
                // audio, no injection, no history entry.
                self.sink
                    .notify_error(ErrorKind::TranscriptionFailed, &e.to_string());
                return;
            }
        };

        if raw_transcript.trim().is_empty() {
            log::info!("Transcript is empty, nothing to inject");
            return;
        }

        let dictionary = self.settings.dictionary();
        let final_text = formatter.format(&raw_transcript, &dictionary).await;

        match self.injector.write_clipboard(&final_text) {
            Ok(()) => {
                // Tiny settle buffer: the paste chord must see the fresh
                // clipboard contents.
                tokio::time::sleep(Duration::from_millis(10)).await;

                if !self.injector.simulate_paste() {
                    self.sink.notify_error(
                        ErrorKind::InjectionFailed,
                        "Paste failed. The text is still on the clipboard; paste manually with Cmd+V.",
                    );
                }
            }
            Err(e) => {
                log::error!("Clipboard write failed: {}", e);
                self.sink
                    .notify_error(ErrorKind::InjectionFailed, &e.to_string());
            }
        }

        // History is appended whenever text was produced, even if the
        // paste itself failed.
        let duration_ms = started_instant.elapsed().as_millis() as u64;
        if let Err(e) = self.history.append(
            final_text.clone(),
            raw_transcript,
            started_at,
            duration_ms,
        ) {
            log::error!("Failed to append history entry: {}", e);
        }

        self.sink.dictation_complete(&final_text);
    }

    fn reset_to_idle(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.phase = Phase::Idle;
        }
        self.sink.widget_state(WidgetState::Idle);
    }
}

fn capture_error_kind(error: &CaptureError) -> ErrorKind {
    match error {
        CaptureError::NoInputDevice => ErrorKind::NoInputDevice,
        CaptureError::AlreadyRecording => ErrorKind::AlreadyRecording,
        _ => ErrorKind::CaptureFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_state_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&WidgetState::RecordingHotkey).unwrap(),
            "\"recording-hotkey\""
        );
        assert_eq!(
            serde_json::to_string(&WidgetState::RecordingClick).unwrap(),
            "\"recording-click\""
        );
        assert_eq!(serde_json::to_string(&WidgetState::Idle).unwrap(), "\"idle\"");
        assert_eq!(
            serde_json::to_string(&WidgetState::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::TranscriptionFailed).unwrap(),
            "\"transcription_failed\""
        );
    }
}
