//! Text injection: clipboard write + paste keystroke.
//!
//! The final text always lands on the clipboard first; the paste
//! keystroke is best-effort. A failed paste is not a data loss (the user
//! can paste manually), so it is surfaced as a notification, never
//! retried.

use enigo::{Direction, Enigo, Key, Keyboard, Settings as EnigoSettings};
use tauri::AppHandle;

/// Errors writing to the clipboard. Local operation, effectively always
/// succeeds; kept as a Result for logging.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Places text into the focused application.
pub trait Injector: Send + Sync {
    fn write_clipboard(&self, text: &str) -> Result<(), InjectError>;

    /// Simulate the paste keystroke. `false` means the keystroke could not
    /// be delivered (e.g. missing accessibility permission); the text is
    /// still on the clipboard.
    fn simulate_paste(&self) -> bool;
}

/// Production injector: arboard clipboard + enigo keystroke.
pub struct SystemInjector {
    app: AppHandle,
}

impl SystemInjector {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Injector for SystemInjector {
    fn write_clipboard(&self, text: &str) -> Result<(), InjectError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| InjectError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| InjectError::Clipboard(e.to_string()))?;

        log::info!(
            "Wrote {} chars to clipboard: \"{}\"",
            text.len(),
            preview(text)
        );
        Ok(())
    }

    fn simulate_paste(&self) -> bool {
        match send_paste_keystroke(&self.app) {
            Ok(()) => {
                log::info!("Paste keystroke delivered");
                true
            }
            Err(e) => {
                log::error!("Paste keystroke failed: {}", e);
                false
            }
        }
    }
}

fn preview(text: &str) -> String {
    let mut p: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        p.push_str("...");
    }
    p
}

/// Press the platform paste chord (Cmd+V on macOS, Ctrl+V elsewhere).
fn send_paste_keystroke(app: &AppHandle) -> Result<(), String> {
    // On macOS, enigo requires running on the main thread.
    #[cfg(target_os = "macos")]
    {
        let (tx, rx) = std::sync::mpsc::channel::<Result<(), String>>();
        app.run_on_main_thread(move || {
            let _ = tx.send(paste_chord(Key::Meta));
        })
        .map_err(|e| e.to_string())?;
        rx.recv().map_err(|e| e.to_string())?
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = app;
        paste_chord(Key::Control)
    }
}

fn paste_chord(modifier: Key) -> Result<(), String> {
    let mut enigo = Enigo::new(&EnigoSettings::default()).map_err(|e| e.to_string())?;

    enigo.key(modifier, Direction::Press).map_err(|e| e.to_string())?;
    let result = enigo.key(Key::Unicode('v'), Direction::Click);
    // Always release the modifier, even when the click failed.
    let release = enigo.key(modifier, Direction::Release);

    result.map_err(|e| e.to_string())?;
    release.map_err(|e| e.to_string())?;
    Ok(())
}

/// Whether the OS allows us to inject keystrokes.
///
/// On macOS this probes System Events, which requires the Accessibility
/// permission; elsewhere injection needs no special grant.
pub fn accessibility_granted() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("osascript")
            .args(["-e", "tell application \"System Events\" to get name of first process"])
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Deep link into the macOS Accessibility privacy pane.
pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_text() {
        let long = "x".repeat(80);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 53);
    }

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("hello"), "hello");
    }
}
