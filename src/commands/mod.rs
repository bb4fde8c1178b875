//! Tauri command surface for the widget, settings and onboarding windows.

pub mod dictionary;
pub mod history;
pub mod recording;
pub mod settings;
