//! End-to-end orchestrator tests against in-memory collaborators.

use crate::capture::{CaptureError, CaptureSession, CapturedAudio};
use crate::formatting::{FormatError, FormatProvider, FormattingGateway, LocalRulesFormatter};
use crate::history::HistoryStorage;
use crate::orchestrator::{
    ErrorKind, GatewaySlot, Orchestrator, RecordingSource, StatusSink, WidgetState,
};
use crate::paste::{InjectError, Injector};
use crate::settings::{Dictionary, LanguagePreference, SettingsSource};
use crate::stt::{SttError, TranscriptionGateway, TranscriptionProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CaptureState {
    start_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    recording: AtomicBool,
}

/// Scriptable capture session.
struct FakeCapture {
    state: Arc<CaptureState>,
    fail_start: Option<fn() -> CaptureError>,
    empty: bool,
}

impl FakeCapture {
    fn ok(state: Arc<CaptureState>) -> Self {
        Self {
            state,
            fail_start: None,
            empty: false,
        }
    }

    fn failing_start(state: Arc<CaptureState>) -> Self {
        Self {
            state,
            fail_start: Some(|| CaptureError::NoInputDevice),
            empty: false,
        }
    }

    fn empty_recording(state: Arc<CaptureState>) -> Self {
        Self {
            state,
            fail_start: None,
            empty: true,
        }
    }
}

impl CaptureSession for FakeCapture {
    fn start(&mut self, _device_name: Option<&str>) -> Result<(), CaptureError> {
        self.state.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(make_err) = self.fail_start {
            return Err(make_err());
        }
        self.state.recording.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<CapturedAudio, CaptureError> {
        self.state.recording.store(false, Ordering::SeqCst);
        if self.empty {
            return Err(CaptureError::EmptyRecording);
        }
        Ok(CapturedAudio {
            wav_bytes: vec![0u8; 128],
            duration_secs: 0.5,
        })
    }

    fn cancel(&mut self) {
        self.state.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.state.recording.store(false, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.state.recording.load(Ordering::SeqCst)
    }
}

/// Transcriber returning a fixed result and counting invocations.
struct FixedStt {
    result: Result<&'static str, ()>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptionProvider for FixedStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, SttError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.result {
            Ok(text) => Ok(text.to_string()),
            Err(()) => Err(SttError::Api("upstream unavailable".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Transcriber that parks until released, to observe the Processing phase.
struct GatedStt {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl TranscriptionProvider for GatedStt {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, SttError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok("gated text".to_string())
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

struct FailingFormatProvider;

#[async_trait]
impl FormatProvider for FailingFormatProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        _transcript: &str,
    ) -> Result<String, FormatError> {
        Err(FormatError::Api("formatting offline".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[derive(Default)]
struct FakeInjector {
    clipboard: Mutex<Vec<String>>,
    paste_calls: AtomicUsize,
    paste_ok: AtomicBool,
}

impl FakeInjector {
    fn new(paste_ok: bool) -> Self {
        let injector = Self::default();
        injector.paste_ok.store(paste_ok, Ordering::SeqCst);
        injector
    }

    fn last_clipboard(&self) -> Option<String> {
        self.clipboard.lock().unwrap().last().cloned()
    }
}

impl Injector for FakeInjector {
    fn write_clipboard(&self, text: &str) -> Result<(), InjectError> {
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn simulate_paste(&self) -> bool {
        self.paste_calls.fetch_add(1, Ordering::SeqCst);
        self.paste_ok.load(Ordering::SeqCst)
    }
}

struct FixedSettings {
    dictionary: Dictionary,
}

impl Default for FixedSettings {
    fn default() -> Self {
        Self {
            dictionary: Dictionary::new(),
        }
    }
}

impl SettingsSource for FixedSettings {
    fn language(&self) -> LanguagePreference {
        LanguagePreference::English
    }

    fn dictionary(&self) -> Dictionary {
        self.dictionary.clone()
    }

    fn sound_enabled(&self) -> bool {
        false
    }

    fn input_device(&self) -> Option<String> {
        None
    }
}

#[derive(Default)]
struct RecordingSink {
    states: Mutex<Vec<WidgetState>>,
    errors: Mutex<Vec<ErrorKind>>,
    completed: Mutex<Vec<String>>,
}

impl StatusSink for RecordingSink {
    fn widget_state(&self, state: WidgetState) {
        self.states.lock().unwrap().push(state);
    }

    fn notify_error(&self, kind: ErrorKind, _message: &str) {
        self.errors.lock().unwrap().push(kind);
    }

    fn dictation_complete(&self, text: &str) {
        self.completed.lock().unwrap().push(text.to_string());
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    orchestrator: Orchestrator,
    capture_state: Arc<CaptureState>,
    stt_calls: Arc<AtomicUsize>,
    injector: Arc<FakeInjector>,
    sink: Arc<RecordingSink>,
    history: Arc<HistoryStorage>,
    _dir: tempfile::TempDir,
}

fn harness(
    capture: fn(Arc<CaptureState>) -> FakeCapture,
    stt_result: Result<&'static str, ()>,
    formatter: FormattingGateway,
    paste_ok: bool,
) -> Harness {
    let capture_state = Arc::new(CaptureState::default());
    let stt_calls = Arc::new(AtomicUsize::new(0));
    let injector = Arc::new(FakeInjector::new(paste_ok));
    let sink = Arc::new(RecordingSink::default());
    let dir = tempfile::tempdir().expect("tempdir");
    let history = Arc::new(HistoryStorage::new(dir.path().to_path_buf()));

    let stt = Arc::new(FixedStt {
        result: stt_result,
        calls: stt_calls.clone(),
    });
    let transcriber = Arc::new(TranscriptionGateway::new(stt.clone(), stt));

    let orchestrator = Orchestrator::new(
        Box::new(capture(capture_state.clone())),
        Arc::new(GatewaySlot::new(transcriber, Arc::new(formatter))),
        injector.clone(),
        history.clone(),
        Arc::new(FixedSettings::default()),
        sink.clone(),
    );

    Harness {
        orchestrator,
        capture_state,
        stt_calls,
        injector,
        sink,
        history,
        _dir: dir,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_dictation_injects_and_records_history() {
    let h = harness(
        FakeCapture::ok,
        Ok("hello world"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);
    assert_eq!(h.orchestrator.widget_state(), WidgetState::RecordingHotkey);

    h.orchestrator.activation_stop().await;

    assert_eq!(h.orchestrator.widget_state(), WidgetState::Idle);
    assert_eq!(h.injector.last_clipboard().as_deref(), Some("Hello world"));
    assert_eq!(h.injector.paste_calls.load(Ordering::SeqCst), 1);

    let entries = h.history.get_all(None).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "Hello world");
    assert_eq!(entries[0].raw_text, "hello world");
    assert!(h.sink.errors.lock().unwrap().is_empty());
    assert_eq!(h.sink.completed.lock().unwrap().as_slice(), ["Hello world"]);
}

#[tokio::test]
async fn formatting_failure_injects_raw_transcript() {
    let h = harness(
        FakeCapture::ok,
        Ok("hello world"),
        FormattingGateway::new(Arc::new(FailingFormatProvider)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);
    h.orchestrator.activation_stop().await;

    // Degrade-gracefully: the raw transcript is injected unmodified.
    assert_eq!(h.injector.last_clipboard().as_deref(), Some("hello world"));
    let entries = h.history.get_all(None).unwrap();
    assert_eq!(entries[0].text, "hello world");
    assert!(h.sink.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failing_capture_start_stays_idle() {
    let h = harness(
        FakeCapture::failing_start,
        Ok("unused"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);

    assert_eq!(h.orchestrator.widget_state(), WidgetState::Idle);
    assert_eq!(
        h.sink.errors.lock().unwrap().as_slice(),
        [ErrorKind::NoInputDevice]
    );
    // No recording state was ever published.
    assert!(h.sink.states.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_recording_returns_to_idle_without_pipeline() {
    let h = harness(
        FakeCapture::empty_recording,
        Ok("unused"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);
    h.orchestrator.activation_stop().await;

    assert_eq!(h.orchestrator.widget_state(), WidgetState::Idle);
    assert_eq!(h.stt_calls.load(Ordering::SeqCst), 0);
    assert!(h.history.is_empty());
    // Silent return: no error surfaced.
    assert!(h.sink.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transcription_failure_aborts_without_injection_or_history() {
    let h = harness(
        FakeCapture::ok,
        Err(()),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);
    h.orchestrator.activation_stop().await;

    assert_eq!(h.orchestrator.widget_state(), WidgetState::Idle);
    assert!(h.injector.last_clipboard().is_none());
    assert!(h.history.is_empty());
    assert_eq!(
        h.sink.errors.lock().unwrap().as_slice(),
        [ErrorKind::TranscriptionFailed]
    );
}

#[tokio::test]
async fn injection_failure_still_appends_history() {
    let h = harness(
        FakeCapture::ok,
        Ok("hello world"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        false,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);
    h.orchestrator.activation_stop().await;

    // The text was produced: it stays on the clipboard and in history.
    assert_eq!(h.injector.last_clipboard().as_deref(), Some("Hello world"));
    assert_eq!(h.history.get_all(None).unwrap().len(), 1);
    assert_eq!(
        h.sink.errors.lock().unwrap().as_slice(),
        [ErrorKind::InjectionFailed]
    );
}

#[tokio::test]
async fn cancel_during_recording_discards_everything() {
    let h = harness(
        FakeCapture::ok,
        Ok("unused"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Click);
    assert_eq!(h.orchestrator.widget_state(), WidgetState::RecordingClick);

    h.orchestrator.cancel();

    assert_eq!(h.orchestrator.widget_state(), WidgetState::Idle);
    assert_eq!(h.capture_state.cancel_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.stt_calls.load(Ordering::SeqCst), 0);
    assert!(h.history.is_empty());
}

#[tokio::test]
async fn repeated_activation_start_is_ignored_while_recording() {
    let h = harness(
        FakeCapture::ok,
        Ok("unused"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_start(RecordingSource::Hotkey);
    h.orchestrator.activation_start(RecordingSource::Hotkey);
    h.orchestrator.activation_start(RecordingSource::Click);

    assert_eq!(h.capture_state.start_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.orchestrator.widget_state(), WidgetState::RecordingHotkey);
}

#[tokio::test]
async fn activation_stop_when_idle_is_a_noop() {
    let h = harness(
        FakeCapture::ok,
        Ok("unused"),
        FormattingGateway::new(Arc::new(LocalRulesFormatter)),
        true,
    );

    h.orchestrator.activation_stop().await;

    assert_eq!(h.orchestrator.widget_state(), WidgetState::Idle);
    assert_eq!(h.stt_calls.load(Ordering::SeqCst), 0);
    assert!(h.sink.states.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn activation_start_during_processing_has_no_effect() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let capture_state = Arc::new(CaptureState::default());
    let injector = Arc::new(FakeInjector::new(true));
    let sink = Arc::new(RecordingSink::default());
    let dir = tempfile::tempdir().expect("tempdir");
    let history = Arc::new(HistoryStorage::new(dir.path().to_path_buf()));

    let stt = Arc::new(GatedStt {
        entered: entered.clone(),
        release: release.clone(),
    });
    let orchestrator = Orchestrator::new(
        Box::new(FakeCapture::ok(capture_state.clone())),
        Arc::new(GatewaySlot::new(
            Arc::new(TranscriptionGateway::new(stt.clone(), stt)),
            Arc::new(FormattingGateway::new(Arc::new(LocalRulesFormatter))),
        )),
        injector.clone(),
        history.clone(),
        Arc::new(FixedSettings::default()),
        sink.clone(),
    );

    orchestrator.activation_start(RecordingSource::Hotkey);

    let stopper = orchestrator.clone();
    let handle = tokio::spawn(async move { stopper.activation_stop().await });

    // Wait until the pipeline is provably inside transcription.
    entered.notified().await;
    assert_eq!(orchestrator.widget_state(), WidgetState::Processing);

    // Re-pressing the hotkey mid-pipeline is ignored, not queued.
    orchestrator.activation_start(RecordingSource::Hotkey);
    assert_eq!(orchestrator.widget_state(), WidgetState::Processing);
    assert_eq!(capture_state.start_calls.load(Ordering::SeqCst), 1);

    // Cancel is also past its window once Processing has begun.
    orchestrator.cancel();
    assert_eq!(orchestrator.widget_state(), WidgetState::Processing);
    assert_eq!(capture_state.cancel_calls.load(Ordering::SeqCst), 0);

    release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("pipeline should finish")
        .expect("stop task should not panic");

    assert_eq!(orchestrator.widget_state(), WidgetState::Idle);
    assert_eq!(history.get_all(None).unwrap().len(), 1);
}

#[tokio::test]
async fn dictionary_replacement_flows_through_pipeline() {
    let capture_state = Arc::new(CaptureState::default());
    let injector = Arc::new(FakeInjector::new(true));
    let sink = Arc::new(RecordingSink::default());
    let dir = tempfile::tempdir().expect("tempdir");
    let history = Arc::new(HistoryStorage::new(dir.path().to_path_buf()));
    let stt_calls = Arc::new(AtomicUsize::new(0));

    let stt = Arc::new(FixedStt {
        result: Ok("i love stayfree"),
        calls: stt_calls,
    });

    let settings = FixedSettings {
        dictionary: [("stayfree".to_string(), "StayFree".to_string())]
            .into_iter()
            .collect(),
    };

    let orchestrator = Orchestrator::new(
        Box::new(FakeCapture::ok(capture_state)),
        Arc::new(GatewaySlot::new(
            Arc::new(TranscriptionGateway::new(stt.clone(), stt)),
            // Echo-style provider keeps casing so the literal dictionary
            // semantics are observable end to end.
            Arc::new(FormattingGateway::new(Arc::new(EchoFormatProvider))),
        )),
        injector.clone(),
        history,
        Arc::new(settings),
        sink,
    );

    orchestrator.activation_start(RecordingSource::Hotkey);
    orchestrator.activation_stop().await;

    assert_eq!(
        injector.last_clipboard().as_deref(),
        Some("i love StayFree")
    );
}

struct EchoFormatProvider;

#[async_trait]
impl FormatProvider for EchoFormatProvider {
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
