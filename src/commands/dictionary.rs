//! User dictionary commands (term → replacement).

use crate::settings::{self, Dictionary};
use tauri::AppHandle;

#[tauri::command]
pub fn get_dictionary(app: AppHandle) -> Dictionary {
    settings::get_setting_from_store(&app, "dictionary", Dictionary::new())
}

/// Insert or update one entry. Terms are unique; setting an existing term
/// overwrites its replacement.
#[tauri::command]
pub fn set_dictionary_entry(
    app: AppHandle,
    term: String,
    replacement: String,
) -> Result<(), String> {
    let term = term.trim().to_string();
    if term.is_empty() {
        return Err("Dictionary term cannot be empty".to_string());
    }

    let mut dictionary = get_dictionary(app.clone());
    dictionary.insert(term, replacement);
    settings::set_setting_in_store(&app, "dictionary", &dictionary)
}

#[tauri::command]
pub fn remove_dictionary_entry(app: AppHandle, term: String) -> Result<bool, String> {
    let mut dictionary = get_dictionary(app.clone());
    let removed = dictionary.remove(&term).is_some();
    if removed {
        settings::set_setting_in_store(&app, "dictionary", &dictionary)?;
    }
    Ok(removed)
}
