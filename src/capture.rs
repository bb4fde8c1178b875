//! Microphone capture for dictation sessions.
//!
//! One recording at a time: `start()` opens a cpal input stream on a
//! dedicated thread (cpal streams are not Send), `stop()` finalizes the
//! buffered samples into WAV bytes for the transcription gateway, and
//! `cancel()` discards them. The session is behind a trait so the
//! orchestrator can be driven with an in-memory session in tests.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use hound::{WavSpec, WavWriter};
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Upper bound for a single dictation recording; the buffer keeps the most
/// recent audio if the user holds the key longer.
const MAX_RECORDING_SECS: f32 = 300.0;

/// Errors that can occur during audio capture.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No input device available")]
    NoInputDevice,

    #[error("Failed to get device config: {0}")]
    DeviceConfig(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("Failed to start audio stream: {0}")]
    StreamStart(String),

    #[error("Failed to encode audio: {0}")]
    Encoding(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("Recording captured no audio")]
    EmptyRecording,
}

/// A finished recording, ready for the transcription gateway.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub wav_bytes: Vec<u8>,
    pub duration_secs: f32,
}

/// One microphone recording lifecycle.
///
/// Implementations enforce the single-session invariant: `start()` while
/// a session is open is `AlreadyRecording`, never a silent restart.
pub trait CaptureSession: Send {
    fn start(&mut self, device_name: Option<&str>) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<CapturedAudio, CaptureError>;
    fn cancel(&mut self);
    fn is_recording(&self) -> bool;
}

/// Audio buffer that accumulates interleaved f32 samples during recording.
#[derive(Debug)]
struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    max_duration_secs: f32,
}

impl AudioBuffer {
    fn new(sample_rate: u32, channels: u16, max_duration_secs: f32) -> Self {
        let capacity = (sample_rate as f32 * max_duration_secs * channels as f32) as usize;
        Self {
            samples: Vec::with_capacity(capacity.min(1 << 24)),
            sample_rate,
            channels,
            max_duration_secs,
        }
    }

    fn append(&mut self, new_samples: &[f32]) {
        self.samples.extend_from_slice(new_samples);

        let max_samples =
            (self.sample_rate as f32 * self.max_duration_secs * self.channels as f32) as usize;
        if self.samples.len() > max_samples {
            let drain_count = self.samples.len() - max_samples;
            self.samples.drain(0..drain_count);
        }
    }

    fn clear(&mut self) {
        self.samples.clear();
    }

    fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    /// Encode the buffer as 16-bit PCM WAV.
    fn to_wav_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| CaptureError::Encoding(e.to_string()))?;

            for &sample in &self.samples {
                let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(sample_i16)
                    .map_err(|e| CaptureError::Encoding(e.to_string()))?;
            }

            writer
                .finalize()
                .map_err(|e| CaptureError::Encoding(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

enum CaptureCommand {
    Stop,
}

struct CaptureHandle {
    command_tx: mpsc::Sender<CaptureCommand>,
    thread_handle: JoinHandle<Result<(), CaptureError>>,
}

/// cpal-backed capture session.
pub struct CpalCaptureSession {
    buffer: Arc<Mutex<AudioBuffer>>,
    capture_handle: Option<CaptureHandle>,
}

impl CpalCaptureSession {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(AudioBuffer::new(44100, 1, MAX_RECORDING_SECS))),
            capture_handle: None,
        }
    }

    /// Resolve the input device: exact name match when configured, system
    /// default otherwise (and when the named device has gone away).
    fn resolve_device(device_name: Option<&str>) -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();

        if let Some(name) = device_name.filter(|n| !n.is_empty()) {
            let found = host
                .input_devices()
                .map_err(|e| CaptureError::DeviceConfig(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false));

            match found {
                Some(device) => return Ok(device),
                None => {
                    log::warn!(
                        "Configured input device '{}' not found, using system default",
                        name
                    );
                }
            }
        }

        host.default_input_device().ok_or(CaptureError::NoInputDevice)
    }

    fn shutdown_stream(&mut self) {
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.command_tx.send(CaptureCommand::Stop);
            let _ = handle.thread_handle.join();
        }
    }
}

impl Default for CpalCaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession for CpalCaptureSession {
    fn start(&mut self, device_name: Option<&str>) -> Result<(), CaptureError> {
        if self.capture_handle.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let device = Self::resolve_device(device_name)?;
        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceConfig(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        log::info!(
            "Capture config: {} Hz, {} channels, {:?}",
            sample_rate,
            channels,
            config.sample_format()
        );

        self.buffer = Arc::new(Mutex::new(AudioBuffer::new(
            sample_rate,
            channels,
            MAX_RECORDING_SECS,
        )));

        let buffer = self.buffer.clone();
        let (command_tx, command_rx) = mpsc::channel();
        let sample_format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        let thread_handle = thread::spawn(move || {
            run_capture_thread(device, stream_config, sample_format, buffer, command_rx)
        });

        // The stream is built inside the capture thread; surface immediate
        // failures (bad device, format rejection) to the caller.
        thread::sleep(std::time::Duration::from_millis(10));
        if thread_handle.is_finished() {
            return match thread_handle.join() {
                Ok(Err(e)) => Err(e),
                Ok(Ok(())) => Err(CaptureError::StreamStart(
                    "capture thread exited immediately".to_string(),
                )),
                Err(_) => Err(CaptureError::StreamStart("capture thread panicked".to_string())),
            };
        }

        self.capture_handle = Some(CaptureHandle {
            command_tx,
            thread_handle,
        });

        log::info!("Audio capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<CapturedAudio, CaptureError> {
        if self.capture_handle.is_none() {
            return Err(CaptureError::NotRecording);
        }
        self.shutdown_stream();

        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| CaptureError::Encoding("Failed to lock buffer".to_string()))?;

        if buffer.is_empty() {
            buffer.clear();
            return Err(CaptureError::EmptyRecording);
        }

        let duration_secs = buffer.duration_secs();
        let wav_bytes = buffer.to_wav_bytes()?;
        buffer.clear();

        log::info!(
            "Audio capture stopped, {} bytes captured ({:.2}s)",
            wav_bytes.len(),
            duration_secs
        );

        Ok(CapturedAudio {
            wav_bytes,
            duration_secs,
        })
    }

    fn cancel(&mut self) {
        self.shutdown_stream();
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
        log::info!("Audio capture cancelled, buffers discarded");
    }

    fn is_recording(&self) -> bool {
        self.capture_handle.is_some()
    }
}

impl Drop for CpalCaptureSession {
    fn drop(&mut self) {
        self.shutdown_stream();
    }
}

/// Run the audio capture in a dedicated thread.
fn run_capture_thread(
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: SampleFormat,
    buffer: Arc<Mutex<AudioBuffer>>,
    command_rx: mpsc::Receiver<CaptureCommand>,
) -> Result<(), CaptureError> {
    use cpal::Sample;

    let err_fn = |err| {
        log::error!("Audio stream error: {}", err);
    };

    let stream = match sample_format {
        SampleFormat::F32 => {
            let buffer = buffer.clone();
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.append(data);
                    }
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let buffer = buffer.clone();
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data.iter().map(|&s| s.to_float_sample()).collect();
                    if let Ok(mut buf) = buffer.lock() {
                        buf.append(&samples);
                    }
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let buffer = buffer.clone();
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data.iter().map(|&s| s.to_float_sample()).collect();
                    if let Ok(mut buf) = buffer.lock() {
                        buf.append(&samples);
                    }
                },
                err_fn,
                None,
            )
        }
        _ => {
            return Err(CaptureError::DeviceConfig(format!(
                "Unsupported sample format: {:?}",
                sample_format
            )));
        }
    }
    .map_err(|e| CaptureError::StreamBuild(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::StreamStart(e.to_string()))?;

    loop {
        match command_rx.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(CaptureCommand::Stop) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Stream is dropped here, stopping capture.
    Ok(())
}

/// List available input device names for the settings UI.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}
