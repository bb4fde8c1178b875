//! Global input watcher for push-to-talk activation.
//!
//! The OS hook (rdev) delivers every key-down/key-up system-wide on its
//! own thread. Hook callbacks must stay cheap: they only map the key to
//! a code and forward it over a channel. A separate dispatch thread owns
//! the [`KeyTracker`] and invokes the activation callback, so the hook
//! keeps observing keys even while a dictation pipeline is mid-flight.

pub mod keycodes;
mod tracker;

pub use tracker::{ActivationEdge, KeyTracker};

use crate::settings::ActivationConfig;
use rdev::{Event, EventType};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

/// Errors raised while starting the global input hook.
///
/// Hook failures are fatal to push-to-talk: there is no retry. The caller
/// decides whether the app can limp along with click-to-record only.
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("failed to start global input hook: {0}")]
    HookFailed(String),
}

/// A raw key edge forwarded from the hook thread.
#[derive(Debug, Clone, Copy)]
enum KeyEdge {
    Down(u32),
    Up(u32),
}

/// Shared, hot-swappable activation configuration.
///
/// The settings UI replaces the config at runtime; the dispatch thread
/// re-reads it on every event so changes apply to the next keystroke.
pub type SharedActivationConfig = Arc<RwLock<ActivationConfig>>;

/// Watches system-wide keyboard events and emits activation edges.
pub struct InputWatcher {
    _dispatch: thread::JoinHandle<()>,
}

impl InputWatcher {
    /// Start the hook and dispatch threads.
    ///
    /// `on_edge` runs on the dispatch thread and must not block for long;
    /// the orchestrator entry points only take a state transition and
    /// spawn async work.
    ///
    /// rdev only reports hook startup failure by returning from `listen`,
    /// so startup errors are detected by giving the hook thread a short
    /// window to fail before declaring the watcher healthy.
    pub fn spawn<F>(
        config: SharedActivationConfig,
        on_edge: F,
    ) -> Result<Self, WatcherError>
    where
        F: Fn(ActivationEdge) + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel::<KeyEdge>();
        let (startup_tx, startup_rx) = mpsc::channel::<String>();

        thread::Builder::new()
            .name("stayfree-input-hook".into())
            .spawn(move || {
                let callback = move |event: Event| match event.event_type {
                    EventType::KeyPress(key) => {
                        if let Some(code) = keycodes::key_to_code(key) {
                            let _ = event_tx.send(KeyEdge::Down(code));
                        }
                    }
                    EventType::KeyRelease(key) => {
                        if let Some(code) = keycodes::key_to_code(key) {
                            let _ = event_tx.send(KeyEdge::Up(code));
                        }
                    }
                    _ => {}
                };

                // Blocks for the lifetime of the hook; returns only on error.
                if let Err(e) = rdev::listen(callback) {
                    log::error!("Global input hook stopped: {:?}", e);
                    let _ = startup_tx.send(format!("{:?}", e));
                }
            })
            .map_err(|e| WatcherError::HookFailed(e.to_string()))?;

        // A hook that cannot start (missing input-monitoring permission,
        // no display server) fails within milliseconds.
        if let Ok(err) = startup_rx.recv_timeout(Duration::from_millis(300)) {
            return Err(WatcherError::HookFailed(err));
        }

        let dispatch = thread::Builder::new()
            .name("stayfree-input-dispatch".into())
            .spawn(move || {
                let mut tracker = KeyTracker::new();
                while let Ok(edge) = event_rx.recv() {
                    let snapshot = match config.read() {
                        Ok(cfg) => cfg.clone(),
                        Err(_) => continue,
                    };

                    let signal = match edge {
                        KeyEdge::Down(code) => tracker.key_down(code, &snapshot),
                        KeyEdge::Up(code) => tracker.key_up(code, &snapshot),
                    };

                    if let Some(signal) = signal {
                        log::debug!("Activation edge: {:?}", signal);
                        on_edge(signal);
                    }
                }
            })
            .map_err(|e| WatcherError::HookFailed(e.to_string()))?;

        Ok(Self {
            _dispatch: dispatch,
        })
    }
}
