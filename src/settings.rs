//! Typed access to the flat settings store (`settings.json`).
//!
//! The store is a plain key-value document owned by the settings UI; the
//! backend reads a handful of keys through typed helpers and seeds
//! defaults for missing keys so both sides agree on effective values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;

/// Default push-to-talk key: Left Option (macOS virtual key code 58).
pub const DEFAULT_PRIMARY_KEY: u32 = 58;

/// Default combo fallback: Control+Shift.
pub const DEFAULT_COMBO_KEYS: &[u32] = &[59, 56];

/// User dictionary: term → replacement, unique terms.
pub type Dictionary = BTreeMap<String, String>;

/// Which key or combo triggers push-to-talk.
///
/// Exactly one rule is in effect at a time: a single key when
/// `use_combo` is false, otherwise all keys of `combo_keys` held together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationConfig {
    pub use_combo: bool,
    pub primary_key: u32,
    pub combo_keys: BTreeSet<u32>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            use_combo: false,
            primary_key: DEFAULT_PRIMARY_KEY,
            combo_keys: DEFAULT_COMBO_KEYS.iter().copied().collect(),
        }
    }
}

/// Stored language preference selecting the transcription provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    /// English: accuracy + speed optimized provider.
    #[default]
    English,
    /// Hindi / code-mixed Hinglish with Roman-script output.
    Hinglish,
}

impl LanguagePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguagePreference::English => "english",
            LanguagePreference::Hinglish => "hinglish",
        }
    }
}

/// Snapshot of all persisted settings, as shown in the settings UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub activation: ActivationConfig,
    pub language: LanguagePreference,
    pub dictionary: Dictionary,
    pub groq_api_key: String,
    pub sarvam_api_key: String,
    pub input_device: String,
    pub sound_enabled: bool,
    pub onboarding_complete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            activation: ActivationConfig::default(),
            language: LanguagePreference::default(),
            dictionary: Dictionary::new(),
            groq_api_key: String::new(),
            sarvam_api_key: String::new(),
            input_device: String::new(),
            sound_enabled: true,
            onboarding_complete: false,
        }
    }
}

/// Settings the orchestrator reads per dictation.
///
/// Behind a trait so pipeline tests can pin values without a Tauri app.
pub trait SettingsSource: Send + Sync {
    fn language(&self) -> LanguagePreference;
    fn dictionary(&self) -> Dictionary;
    fn sound_enabled(&self) -> bool;
    fn input_device(&self) -> Option<String>;
}

/// Helper to read a setting from the store with a default fallback.
pub fn get_setting_from_store<T: serde::de::DeserializeOwned>(
    app: &AppHandle,
    key: &str,
    default: T,
) -> T {
    app.store("settings.json")
        .ok()
        .and_then(|store| store.get(key))
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(default)
}

/// Write one setting and persist the store.
pub fn set_setting_in_store<T: Serialize>(
    app: &AppHandle,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let store = app
        .store("settings.json")
        .map_err(|e| format!("Failed to open settings store: {}", e))?;
    let json = serde_json::to_value(value).map_err(|e| e.to_string())?;
    store.set(key.to_string(), json);
    store.save().map_err(|e| format!("Failed to save settings: {}", e))
}

/// Seed `settings.json` with defaults for missing/null keys (without
/// overwriting existing values), so the UI and backend see the same
/// effective configuration.
pub fn ensure_default_settings(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Value};

    let store = app.store("settings.json")?;

    let is_missing = |v: Option<Value>| -> bool { matches!(v, None | Some(Value::Null)) };

    let mut dirty = false;
    let mut set_if_missing = |key: &str, value: Value| {
        if is_missing(store.get(key)) {
            store.set(key.to_string(), value);
            dirty = true;
        }
    };

    set_if_missing("activation", serde_json::to_value(ActivationConfig::default())?);
    set_if_missing("language", json!("english"));
    set_if_missing("dictionary", json!({}));
    set_if_missing("groq_api_key", json!(""));
    set_if_missing("sarvam_api_key", json!(""));
    set_if_missing("input_device", json!(""));
    set_if_missing("sound_enabled", json!(true));
    set_if_missing("onboarding_complete", json!(false));

    if dirty {
        // Seeding is best-effort: runtime fallbacks cover a failed save.
        if let Err(e) = store.save() {
            log::warn!("Failed to save seeded default settings: {}", e);
        }
    }

    Ok(())
}

/// Read the full settings snapshot.
pub fn load_settings(app: &AppHandle) -> Settings {
    Settings {
        activation: get_setting_from_store(app, "activation", ActivationConfig::default()),
        language: get_setting_from_store(app, "language", LanguagePreference::default()),
        dictionary: get_setting_from_store(app, "dictionary", Dictionary::new()),
        groq_api_key: get_setting_from_store(app, "groq_api_key", String::new()),
        sarvam_api_key: get_setting_from_store(app, "sarvam_api_key", String::new()),
        input_device: get_setting_from_store(app, "input_device", String::new()),
        sound_enabled: get_setting_from_store(app, "sound_enabled", true),
        onboarding_complete: get_setting_from_store(app, "onboarding_complete", false),
    }
}

/// Store-backed settings source handed to the orchestrator.
pub struct StoreSettings {
    app: AppHandle,
}

impl StoreSettings {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl SettingsSource for StoreSettings {
    fn language(&self) -> LanguagePreference {
        get_setting_from_store(&self.app, "language", LanguagePreference::default())
    }

    fn dictionary(&self) -> Dictionary {
        get_setting_from_store(&self.app, "dictionary", Dictionary::new())
    }

    fn sound_enabled(&self) -> bool {
        get_setting_from_store(&self.app, "sound_enabled", true)
    }

    fn input_device(&self) -> Option<String> {
        let name: String = get_setting_from_store(&self.app, "input_device", String::new());
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}
