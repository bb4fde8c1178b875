//! Settings commands: activation config, language, API keys, devices.

use crate::capture;
use crate::hotkey::SharedActivationConfig;
use crate::orchestrator::GatewaySlot;
use crate::paste;
use crate::settings::{
    self, ActivationConfig, LanguagePreference, Settings,
};
use std::sync::Arc;
use tauri::{AppHandle, Manager, State};
use tauri_plugin_opener::OpenerExt;

#[tauri::command]
pub fn get_settings(app: AppHandle) -> Settings {
    settings::load_settings(&app)
}

/// Persist a new activation rule and hand it to the running input
/// watcher; it applies from the next keystroke.
#[tauri::command]
pub fn set_activation_config(
    app: AppHandle,
    watcher_config: State<'_, SharedActivationConfig>,
    config: ActivationConfig,
) -> Result<(), String> {
    settings::set_setting_in_store(&app, "activation", &config)?;

    let mut current = watcher_config
        .write()
        .map_err(|e| format!("Failed to update watcher config: {}", e))?;
    *current = config;

    log::info!("Activation config updated");
    Ok(())
}

#[tauri::command]
pub fn set_language(app: AppHandle, language: LanguagePreference) -> Result<(), String> {
    settings::set_setting_in_store(&app, "language", &language)?;
    log::info!("Language preference set to {}", language.as_str());
    Ok(())
}

/// Persist API keys and rebuild the gateways so new keys apply without a
/// restart.
#[tauri::command]
pub fn set_api_keys(
    app: AppHandle,
    gateways: State<'_, Arc<GatewaySlot>>,
    groq_api_key: String,
    sarvam_api_key: String,
) -> Result<(), String> {
    settings::set_setting_in_store(&app, "groq_api_key", &groq_api_key)?;
    settings::set_setting_in_store(&app, "sarvam_api_key", &sarvam_api_key)?;

    gateways.reconfigure(groq_api_key, sarvam_api_key);
    Ok(())
}

#[tauri::command]
pub fn set_sound_enabled(app: AppHandle, enabled: bool) -> Result<(), String> {
    settings::set_setting_in_store(&app, "sound_enabled", &enabled)
}

#[tauri::command]
pub fn set_input_device(app: AppHandle, device: String) -> Result<(), String> {
    settings::set_setting_in_store(&app, "input_device", &device)
}

#[tauri::command]
pub fn list_input_devices() -> Vec<String> {
    capture::list_input_devices()
}

/// Whether keystroke injection is currently permitted by the OS.
#[tauri::command]
pub fn check_accessibility() -> bool {
    paste::accessibility_granted()
}

#[tauri::command]
pub fn open_accessibility_settings(app: AppHandle) -> Result<(), String> {
    app.opener()
        .open_url(paste::ACCESSIBILITY_SETTINGS_URL, None::<&str>)
        .map_err(|e| e.to_string())
}

/// Mark onboarding done and close the onboarding window.
#[tauri::command]
pub fn complete_onboarding(app: AppHandle) -> Result<(), String> {
    settings::set_setting_in_store(&app, "onboarding_complete", &true)?;

    if let Some(window) = app.get_webview_window("onboarding") {
        let _ = window.close();
    }

    log::info!("Onboarding complete");
    Ok(())
}

/// Show the settings window (created hidden at startup).
#[tauri::command]
pub fn open_settings_window(app: AppHandle) -> Result<(), String> {
    if let Some(window) = app.get_webview_window("settings") {
        window.show().map_err(|e| e.to_string())?;
        window.set_focus().map_err(|e| e.to_string())?;
    }
    Ok(())
}
